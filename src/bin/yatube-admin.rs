use clap::{Parser, Subcommand};
use menva::read_default_file;
use yatube::{config::SharedConfig, database::Database, errors::AppError, models::Group};

/// Yatube administration commands.
#[derive(Parser, Debug)]
#[command(name = "yatube-admin", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a group authors can post into.
    CreateGroup {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Derived from the title when omitted.
        #[arg(short, long)]
        slug: Option<String>,
    },
    /// List existing groups.
    Groups,
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = SharedConfig::from_env();
    let database = Database::new(&config.database_url)?;
    database.run_migrations().await?;

    match cli.command {
        Commands::CreateGroup {
            title,
            description,
            slug,
        } => {
            let group = Group::create(&database, &title, slug.as_deref(), &description).await?;
            println!("created group {} ({})", group.title, group.slug);
        }
        Commands::Groups => {
            for group in Group::all(&database).await? {
                println!("{}\t{}", group.slug, group.title);
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), AppError> {
    read_default_file();
    let cli = Cli::parse();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::custom_internal(&e.to_string()))?
        .block_on(run(cli))
}
