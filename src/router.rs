use tracing::info;

use crate::app::App;
use crate::calculation::request_range::{RequestType, resolve_request_range_now};
use crate::cli::{Commands, ReportArgs, SplitArgs};
use crate::display::{TableStyle, render_listing};
use crate::io::locator::locate_objects;
use crate::io::store::ObjectStore;
use crate::pipeline::{ReportRequest, compute_range, persist_report};
use crate::prelude::*;
use crate::trigger::{BlobTrigger, handle_blob_created};

/// Runs the requested command and returns what should be printed.
pub fn does_the_thing(ctx: &App) -> AppResult<String> {
    match &ctx.cli.command {
        // blobmeter split.
        Commands::Split(args) => split(ctx, args),

        // blobmeter report.
        Commands::Report(args) => report(ctx, args),
    }
}

fn split(ctx: &App, args: &SplitArgs) -> AppResult<String> {
    let content = ctx
        .store
        .read(&args.container, &args.object)
        .wrap_err_with(|| format!("Failed to read the trigger object '{}'", args.object))?;

    let trigger = BlobTrigger::new(&args.object, content);
    let output_container = args.output_container.as_deref().unwrap_or(&args.container);

    let stored = handle_blob_created(&ctx.store, output_container, &args.output_prefix, &trigger)?;

    Ok(stored.join("\n"))
}

fn report(ctx: &App, args: &ReportArgs) -> AppResult<String> {
    let request_type = RequestType::from(args.request);
    let range = resolve_request_range_now(request_type, args.start, args.end)?;

    info!(
        request = request_type.symbol(),
        start = %range.start(),
        end = %range.end(),
        "Resolved reporting window"
    );

    let template = args.request_template(range.start());

    let mut sections = vec![];

    if args.list_files {
        sections.push(list_files(ctx, &template)?);
    }

    let reports = compute_range(&ctx.store, &template, range)?;

    for report in &reports {
        persist_report(
            &ctx.store,
            &args.report_container,
            &args.report_prefix,
            report,
        )?;

        sections.push(report.render(ctx.cli.unformatted));
    }

    if reports.is_empty() {
        sections.push(format!(
            "No official data between {} and {}.",
            range.start(),
            range.end()
        ));
    }

    Ok(sections.join("\n\n"))
}

/// Tabulates what the locator finds in both containers for the first month of the window.
fn list_files(ctx: &App, template: &ReportRequest) -> AppResult<String> {
    let style = if ctx.cli.unformatted {
        TableStyle::Plain
    } else {
        TableStyle::Psql
    };

    let tables = [&template.monthly, &template.daily]
        .into_iter()
        .map(|container| -> AppResult<String> {
            let files = locate_objects(
                &ctx.store,
                container,
                template.date,
                &template.client_id,
                &template.cycle,
            )?;

            Ok(format!(
                "{}\n{}",
                container.name,
                render_listing(&files, ["Blob Name", "Creation Date"], style)?
            ))
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(tables.join("\n\n"))
}
