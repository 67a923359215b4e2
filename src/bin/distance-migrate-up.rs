//! Database migration tool for distance-counter.
//!
//! Applies the migrations embedded from the `migrations/` directory, creating the database
//! file first if it does not exist.

use arrrg::CommandLine;
use arrrg_derive::CommandLine;

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(required, "SQLite database URL")]
    database_url: String,
}

const USAGE: &str = r#"Usage: distance-migrate-up --database-url <URL>

Run database migrations for distance-counter.

Arguments:
  --database-url <URL>    SQLite database connection URL

Example:
  distance-migrate-up --database-url sqlite://distance.db

The migrations are embedded at compile time from the migrations/ directory."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line(USAGE);

    if !free.is_empty() {
        eprintln!("Error: Unexpected arguments: {:?}", free);
        eprintln!();
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    println!("Connecting to database: {}", options.database_url);
    let pool = distance_counter::sql::connect(&options.database_url, 1).await?;

    println!("Running migrations...");
    distance_counter::sql::migrate(&pool).await?;

    println!("Migrations completed successfully!");
    Ok(())
}
