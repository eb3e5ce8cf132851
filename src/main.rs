mod cli;

use clap::Parser;

use cli::{AccountsCommands, Cli, Commands};

fn main() {
    puc::logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import {
            file,
            sheet,
            start_row,
            overwrite,
            no_hierarchy,
            no_balances,
            no_fiscal,
            atomic,
            json,
        } => cli::import::run(
            &file,
            cli::import::ImportArgs {
                sheet,
                start_row,
                overwrite,
                no_hierarchy,
                no_balances,
                no_fiscal,
                atomic,
                json,
            },
        ),
        Commands::Validate {
            file,
            sheet,
            start_row,
            no_hierarchy,
            json,
        } => cli::import::validate(
            &file,
            cli::import::ImportArgs {
                sheet,
                start_row,
                no_hierarchy,
                json,
                ..Default::default()
            },
        ),
        Commands::Export {
            output,
            status,
            account_type,
            class,
            postable_only,
            include_inactive,
            no_balances,
            no_movements,
            no_fiscal,
        } => {
            let options = puc::models::ExportOptions {
                status,
                account_type,
                class,
                postable_only,
                include_inactive,
                include_balances: !no_balances,
                include_movements: !no_movements,
                include_fiscal: !no_fiscal,
                ..Default::default()
            };
            cli::export::run(options, output)
        }
        Commands::Template { output } => cli::export::template(output),
        Commands::Accounts { command } => match command {
            AccountsCommands::List {
                class,
                include_inactive,
            } => cli::accounts::list(class, include_inactive),
            AccountsCommands::Tree { root, depth } => cli::accounts::tree(root.as_deref(), depth),
            AccountsCommands::Show { code } => cli::accounts::show(&code),
        },
        Commands::Derive { code } => cli::derive::run(&code),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
