use super::{lecturer::current_year, Session};
use crate::{
    libs::{
        export::{ExportFormat, Exporter},
        import::{self, ImportKind, ImportReport, Reconciler, StoreSnapshot},
        messages::Message,
        response::Responder,
        sheet,
        view::View,
    },
    msg_info, msg_warning,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// What the sheet contains
    #[arg(value_enum)]
    kind: ImportKind,
    /// Delimited text file (CSV or tab separated, UTF-8 or Windows-1252)
    file: PathBuf,
    /// Validate and report without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Write the issued lecturer credentials to this CSV file
    #[arg(long)]
    credentials: Option<PathBuf>,
    /// Academic year for lecturer subject assignments
    #[arg(short, long)]
    year: Option<i32>,
}

pub fn cmd(args: ImportArgs, out: &Responder) -> Result<()> {
    let mut session = Session::open()?;
    let rows = sheet::read_rows(&args.file, args.kind)?;
    tracing::info!(kind = %args.kind, rows = rows.len(), file = %args.file.display(), "import started");

    let codec = match args.kind {
        ImportKind::Lecturers => Some(session.config.codec()?),
        ImportKind::Students => None,
    };
    let snapshot = StoreSnapshot::load(&session.db.conn, args.kind)?;
    let mut reconciler = Reconciler::new(snapshot, codec.as_ref(), session.config.password.clone(), rand::thread_rng());
    let mut batch = reconciler.reconcile_batch(rows, args.kind)?;

    if !args.dry_run && batch.report.accepted > 0 {
        import::commit(&mut session.db.conn, &mut batch, args.year.unwrap_or_else(current_year))?;
    }

    if let Some(path) = args.credentials {
        if batch.report.committed && !batch.report.credentials.is_empty() {
            let exporter = Exporter::new(ExportFormat::Csv, "credentials", Some(path));
            exporter.export("Credentials", &batch.report.credentials)?;
            if !out.is_json() {
                msg_info!(Message::CredentialsWritten(exporter.output_path().display().to_string()));
            }
        }
    }

    let (report, message) = if args.dry_run {
        let report = batch.preview();
        let message = Message::ImportDryRun(report.accepted, report.rejected.len());
        (report, message)
    } else {
        let report = batch.report;
        let message = Message::ImportCompleted(report.accepted, report.rejected.len());
        (report, message)
    };
    out.data(message, &report, render)
}

fn render(report: &ImportReport) {
    if !report.rejected.is_empty() {
        msg_warning!(Message::RowsRejected(report.rejected.len()));
        View::table(&report.rejected);
    }
    for warning in &report.warnings {
        msg_warning!(warning);
    }
    if !report.credentials.is_empty() {
        View::table(&report.credentials);
    }
}
