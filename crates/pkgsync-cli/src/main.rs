use std::{
    env,
    str::FromStr,
    sync::{atomic::Ordering, Arc},
};

use clap::Parser;
use cli::Args;
use logging::setup_logging;
use pkgsync_config::{
    config::{set_config_path, Config},
    repository::RepositoryConfig,
};
use pkgsync_core::{ErrorContext, PkgsyncError, PkgsyncResult, SpecificationSet};
use pkgsync_dl::http_client::configure_http_client;
use pkgsync_events::{ChannelSink, EventSinkHandle, NullSink};
use pkgsync_operations::{sync, SyncContext, SyncReport};
use pkgsync_utils::path::resolve_path;
use reporter::{spawn_event_handler, ReporterGuard};
use tracing::{debug, info, warn};
use ureq::http::{HeaderMap, HeaderName, HeaderValue};
use utils::{prompt_password, set_color};

mod cli;
mod logging;
mod reporter;
mod utils;

/// Exit status when any artifact or specifier failed, or the run was interrupted.
const EXIT_SYNC_FAILED: i32 = 2;
/// Exit status when the run could not start.
const EXIT_SETUP_FAILED: i32 = 1;

/// Folds command line flags over the values loaded from the config file.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(url) = &args.source_url {
        config.source.url = url.clone();
    }
    if args.source_username.is_some() {
        config.source.username = args.source_username.clone();
    }
    if args.source_password.is_some() {
        config.source.password = args.source_password.clone();
    }

    let wants_destination = args.destination_url.is_some()
        || args.destination_username.is_some()
        || args.destination_password.is_some();
    if wants_destination {
        let destination = config
            .destination
            .get_or_insert_with(RepositoryConfig::default);
        if let Some(url) = &args.destination_url {
            destination.url = url.clone();
        }
        if args.destination_username.is_some() {
            destination.username = args.destination_username.clone();
        }
        if args.destination_password.is_some() {
            destination.password = args.destination_password.clone();
        }
    }
    if config
        .destination
        .as_ref()
        .is_some_and(|destination| destination.url.trim().is_empty())
    {
        config.destination = None;
    }

    if args.tmp_dir.is_some() {
        config.tmp_dir = args.tmp_dir.clone();
    }
    if args.timeout.is_some() {
        config.timeout = args.timeout.clone();
    }
    if args.user_agent.is_some() {
        config.user_agent = args.user_agent.clone();
    }
    if args.latest {
        config.latest = Some(true);
    }
    if !args.exclude.is_empty() {
        config
            .exclude
            .get_or_insert_with(Vec::new)
            .extend(args.exclude.iter().cloned());
    }
}

fn parse_headers(headers: &[String]) -> PkgsyncResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for header in headers {
        let invalid = || PkgsyncError::Custom(format!("Invalid header `{header}`"));
        let (key, value) = header.split_once(':').ok_or_else(invalid)?;
        let key = HeaderName::from_str(key.trim()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
        map.append(key, value);
    }
    Ok(map)
}

fn check_selection(args: &Args) -> PkgsyncResult<()> {
    let modes = args.selection_modes();
    match modes.len() {
        0 => Err(PkgsyncError::NoSpecifications),
        1 => Ok(()),
        _ => Err(PkgsyncError::ConflictingSelection(modes.join(", "))),
    }
}

fn load_config(args: &Args) -> PkgsyncResult<Config> {
    if let Some(ref c) = args.config {
        let path = resolve_path(c)?;
        let path = if path.is_absolute() {
            path
        } else {
            env::current_dir()
                .with_context(|| "retrieving current directory".into())?
                .join(path)
        };
        set_config_path(path);
    }

    let mut config = Config::new()?;
    apply_overrides(&mut config, args);

    prompt_password(&mut config.source)?;
    if let Some(destination) = config.destination.as_mut() {
        prompt_password(destination)?;
    }

    config.resolve()?;
    Ok(config)
}

fn create_events(args: &Args) -> (EventSinkHandle, Option<ReporterGuard>) {
    if args.quiet || args.json {
        return (Arc::new(NullSink), None);
    }
    let (sink, receiver) = ChannelSink::new();
    (Arc::new(sink), Some(spawn_event_handler(receiver)))
}

fn specification_set(args: &Args, ctx: &SyncContext) -> PkgsyncResult<SpecificationSet> {
    if args.all_packages {
        info!("Synchronising all packages from {}...", ctx.source());
        return SpecificationSet::from_repository(ctx.source(), ctx.exclude());
    }

    if let Some(uri) = &args.versions_file {
        info!("Synchronising packages pinned in {uri}...");
        let source = ctx.source();
        return SpecificationSet::from_uri(uri, source.credentials(), source.transport().as_ref());
    }

    info!("Synchronising packages: {}...", args.specifiers.join(", "));
    SpecificationSet::from_specifiers(&args.specifiers)
}

fn summarize(report: &SyncReport) {
    let synced = report.synced().count();
    let failed = report.failed().count();
    let query_failures = report.query_failures();

    info!(
        "Synchronised {synced} distribution(s); {} package(s) up to date",
        report.up_to_date()
    );
    if failed > 0 || query_failures > 0 {
        warn!("{failed} distribution(s) and {query_failures} package(s) failed");
    }
    if report.interrupted {
        warn!("Interrupted before all packages were synchronised");
    }
}

fn handle_cli() -> PkgsyncResult<SyncReport> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        set_color(false);
    }

    check_selection(&args)?;

    let config = load_config(&args)?;
    debug!(
        source = %config.source.url,
        latest = config.latest(),
        "resolved configuration"
    );

    let timeout = config.get_timeout()?;
    let user_agent = config.user_agent.clone();
    let headers = args
        .header
        .as_deref()
        .map(parse_headers)
        .transpose()?;

    configure_http_client(|cfg| {
        cfg.timeout = Some(timeout);
        if let Some(user_agent) = user_agent {
            cfg.user_agent = Some(user_agent);
        }
        if let Some(headers) = headers {
            cfg.headers = Some(headers);
        }
    });

    let (events, guard) = create_events(&args);
    let ctx = SyncContext::from_config(&config, events)?;

    let flag = ctx.interrupt_flag();
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping after the current distribution");
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|err| PkgsyncError::Custom(format!("Failed to set signal handler: {err}")))?;

    let result = specification_set(&args, &ctx).map(|specs| sync(&ctx, &specs));

    // Drop the context to close the event channel before joining the reporter.
    drop(ctx);
    if let Some(guard) = guard {
        guard.finish();
    }

    let report = result?;
    summarize(&report);
    Ok(report)
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match handle_cli() {
        Ok(report) => {
            if report.has_failures() || report.interrupted {
                std::process::exit(EXIT_SYNC_FAILED);
            }
        }
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(EXIT_SETUP_FAILED);
        }
    }
}
