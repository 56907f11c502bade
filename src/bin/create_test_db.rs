use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finboard::{
    AccountForm, CategoryForm, PasswordHash, TransactionForm, ValidatedPassword, create_account,
    create_category, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the Finboard server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many days of transactions to create, ending today.
    #[arg(long, default_value_t = 60)]
    days: i64,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

const ACCOUNT_NAMES: [&str; 3] = ["Everyday", "Savings", "Credit Card"];
const CATEGORY_NAMES: [&str; 4] = ["Groceries", "Rent", "Eating Out", "Transport"];
const PAYEES: [&str; 6] = [
    "Fresh Market",
    "City Apartments",
    "Corner Cafe",
    "Metro Transit",
    "Noodle Bar",
    "Super Saver",
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with the password '{TEST_PASSWORD}'...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(TEST_EMAIL, password_hash, &conn)?;

    println!("Creating accounts and categories...");
    let accounts = ACCOUNT_NAMES
        .iter()
        .map(|name| {
            create_account(
                &AccountForm {
                    name: (*name).to_owned(),
                },
                user.id,
                &conn,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    let categories = CATEGORY_NAMES
        .iter()
        .map(|name| {
            create_category(
                &CategoryForm {
                    name: (*name).to_owned(),
                },
                user.id,
                &conn,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("Creating {} days of transactions...", args.days);
    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for day in 0..args.days.max(0) {
        let date = today - Duration::days(day);

        if day % 14 == 0 {
            create_transaction(
                &TransactionForm {
                    date,
                    payee: "Employer Ltd".to_owned(),
                    amount: 2450.0,
                    account_id: accounts[0].id.clone(),
                    category_id: None,
                    notes: Some("Salary".to_owned()),
                },
                user.id,
                &conn,
            )?;
            count += 1;
        }

        // Spread a couple of purchases over each day.
        for slot in 0..2 {
            let seed = (day * 7 + slot * 3) as usize;
            let cents = ((seed * 1_733) % 9_000 + 350) as f64;

            create_transaction(
                &TransactionForm {
                    date,
                    payee: PAYEES[seed % PAYEES.len()].to_owned(),
                    amount: -(cents / 100.0),
                    account_id: accounts[seed % accounts.len()].id.clone(),
                    category_id: (seed % 5 != 0)
                        .then(|| categories[seed % categories.len()].id.clone()),
                    notes: None,
                },
                user.id,
                &conn,
            )?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
