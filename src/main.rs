mod cli;
mod pg;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use pgarrow_catalog::{SchemaBuilder, SchemaDump};
use pgarrow_ipc::{ArrowFileWriter, dump_arrow_file};
use pgarrow_result::{Error, Result};
use pgarrow_table::{TableBuffer, TableBufferConfig};
use postgres::{Config, NoTls};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::pg::{FETCH_ROWS, PgCatalog, rows_to_page};

const APPLICATION_NAME: &str = "pg2arrow";

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.dump {
        Some(path) => dump_arrow_file(path, &mut io::stdout().lock()),
        None => run(&cli),
    };
    if let Err(err) = outcome {
        eprintln!("pg2arrow: {err}");
        process::exit(1);
    }
}

fn connect(cli: &Cli) -> Result<postgres::Client> {
    let mut config = Config::new();
    config.application_name(APPLICATION_NAME);
    if let Some(host) = &cli.host {
        config.host(host);
    }
    if let Some(port) = cli.port {
        config.port(port);
    }
    if let Some(dbname) = cli.dbname() {
        config.dbname(dbname);
    }
    if let Some(user) = cli.username() {
        config.user(user);
    }
    if let Some(password) = cli.resolve_password()? {
        config.password(password);
    }
    config.connect(NoTls).map_err(Error::source)
}

/// Open the output file, or create a temporary one that survives the run.
fn open_output(cli: &Cli) -> Result<(File, PathBuf)> {
    match &cli.output {
        Some(path) => Ok((File::create(path)?, path.clone())),
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("pg2arrow-")
                .suffix(".arrow")
                .tempfile()?;
            let (file, path) = tmp.keep().map_err(|e| Error::Io(e.error))?;
            eprintln!("notice: writing result to {}", path.display());
            Ok((file, path))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let sql = cli.query_text()?;
    let config = TableBufferConfig::with_segment_size(cli.segment_size)?;

    let mut client = connect(cli)?;
    let mut tx = client
        .build_transaction()
        .read_only(true)
        .start()
        .map_err(Error::source)?;
    let statement = tx.prepare(&sql).map_err(Error::source)?;

    let schema = {
        let mut catalog = PgCatalog::new(&mut tx);
        let columns = catalog.result_columns(&statement)?;
        SchemaBuilder::new(&mut catalog).build(&columns)?
    };
    tracing::debug!("[SCHEMA] resolved\n{}", SchemaDump(&schema.columns));
    let num_fields = schema.columns.len();

    let (file, path) = open_output(cli)?;
    let mut writer = ArrowFileWriter::try_new(BufWriter::new(file), &schema.columns)?;
    let mut table = TableBuffer::new(schema, config);

    let portal = tx.bind(&statement, &[]).map_err(Error::source)?;
    loop {
        let rows = tx.query_portal(&portal, FETCH_ROWS).map_err(Error::source)?;
        if rows.is_empty() {
            break;
        }
        let page = rows_to_page(&rows, num_fields)?;
        table.append_page(&page, &mut writer)?;
        if rows.len() < FETCH_ROWS as usize {
            break;
        }
    }
    table.flush(&mut writer)?;
    writer.finish(table.blocks())?;
    tx.commit().map_err(Error::source)?;

    tracing::info!(
        "wrote {} rows in {} record batches to {}",
        table.rows_written(),
        table.blocks().len(),
        path.display()
    );
    Ok(())
}
