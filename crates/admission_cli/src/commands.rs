use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use admission::admin::{
    self, ApplicationQuery, ApplicationRecord, ApplicationStatus, ExportFormat, SortDirection,
};
use admission::config::{self, DraftSettings, Preferences, SubmissionSettings, ValidationSettings};
use admission::{
    DraftStore, FileStore, FormController, FormState, HttpTransport, NavigationError, Step,
    SubmissionPipeline, SystemClock, Validator,
};
use app::AppContext;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail, eyre};
use serde_json::json;
use settings::SettingsStore;
use tracing::info;

use crate::cli::{AdminCmd, Cmd, DraftCmd, FormatArg, HistoryCmd, ListArgs, ValidateCmd};

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("parsing {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn settings_store(ctx: &AppContext) -> Result<SettingsStore> {
    let path = ctx.path_context().settings_file(None);
    config::build_settings_store(&path).wrap_err_with(|| format!("loading {}", path.display()))
}

fn draft_store(ctx: &AppContext, settings: &DraftSettings) -> Result<DraftStore<FileStore>> {
    let store = FileStore::open(ctx.path_context().storage_dir())?
        .with_quota(settings.storage_quota_bytes);
    Ok(DraftStore::new(store).with_settings(settings.clone()))
}

pub async fn run(cmd: Cmd, ctx: &AppContext) -> Result<()> {
    let settings = settings_store(ctx)?;
    let draft_settings = settings.get::<DraftSettings>()?;

    match cmd {
        Cmd::Validate { what } => validate(what),
        Cmd::Draft { action } => draft(action, draft_store(ctx, &draft_settings)?),
        Cmd::Submit { form, endpoint } => {
            let mut submission = (*settings.get::<SubmissionSettings>()?).clone();
            if let Some(endpoint) = endpoint {
                submission.endpoint = endpoint;
            }
            let preferences = settings.get::<Preferences>()?;
            submit(&form, &submission, &preferences, draft_store(ctx, &draft_settings)?).await
        }
        Cmd::History { action } => history(action, draft_store(ctx, &draft_settings)?),
        Cmd::Admin { action } => applications(action, ctx),
        Cmd::Config => print_json(&json!({
            "file": settings.file_path(),
            "draft": *draft_settings,
            "submission": *settings.get::<SubmissionSettings>()?,
            "validation": *settings.get::<ValidationSettings>()?,
            "preferences": *settings.get::<Preferences>()?,
        })),
    }
}

fn validate(what: ValidateCmd) -> Result<()> {
    let validator = Validator::default();
    match what {
        ValidateCmd::Field { name, value } => {
            match validator.validate_field(&name, &value) {
                Ok(()) => println!("{name}: valid"),
                Err(err) => println!("{name}: {}", err.message),
            }
            Ok(())
        }
        ValidateCmd::Form { form } => {
            let state: FormState = read_json(&form)?;
            print_json(&validator.summary(&state))
        }
    }
}

fn draft(action: DraftCmd, mut drafts: DraftStore<FileStore>) -> Result<()> {
    match action {
        DraftCmd::Show => match drafts.load_draft() {
            Some(state) => print_json(&state),
            None => {
                println!("No saved draft");
                Ok(())
            }
        },
        DraftCmd::Info => match drafts.draft_info() {
            Some(info) => print_json(&info),
            None => {
                println!("No saved draft");
                Ok(())
            }
        },
        DraftCmd::Save { form } => {
            let state: FormState = read_json(&form)?;
            if !drafts.save_draft(&state) {
                bail!("draft could not be saved; see the log for details");
            }
            println!("Draft saved ({}% complete)", state.completion_percentage());
            Ok(())
        }
        DraftCmd::Clear => {
            if !drafts.clear_draft() {
                bail!("draft could not be cleared");
            }
            println!("Draft cleared");
            Ok(())
        }
        DraftCmd::Usage => {
            let usage = drafts
                .storage_usage()
                .ok_or_else(|| eyre!("storage usage unavailable"))?;
            print_json(&usage)
        }
        DraftCmd::Export { out } => {
            let data = drafts
                .export_data()
                .ok_or_else(|| eyre!("export failed; see the log for details"))?;
            match out {
                Some(path) => {
                    fs::write(&path, data)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{data}"),
            }
            Ok(())
        }
        DraftCmd::Import { file } => {
            let raw = fs::read_to_string(&file)?;
            if !drafts.import_data(&raw) {
                bail!("import of {} failed", file.display());
            }
            println!("Imported {}", file.display());
            Ok(())
        }
    }
}

async fn submit(
    form: &Path,
    submission: &SubmissionSettings,
    preferences: &Preferences,
    drafts: DraftStore<FileStore>,
) -> Result<()> {
    let state: FormState = read_json(form)?;
    let validator = Arc::new(Validator::new(Arc::new(SystemClock)));
    // a failed submission leaves the auto-saved draft behind
    let mut controller = FormController::new(validator, drafts)
        .with_state(state)
        .with_auto_save(preferences.auto_save_interval());

    while controller.current_step() != Step::Review {
        if let Err(err) = controller.next() {
            if let NavigationError::Blocked { step, errors } = &err {
                for e in errors {
                    eprintln!("  {}: {}", e.field, e.message);
                }
                bail!("step {} ({}) is incomplete: {err}", step.number(), step.title());
            }
            return Err(err.into());
        }
    }

    let transport = HttpTransport::new(&submission.endpoint, Duration::from_secs(submission.timeout_secs))?;
    info!("posting to {}", transport.url());
    let pipeline = SubmissionPipeline::new(transport);
    let response = controller.submit(&pipeline).await?;

    println!(
        "{}",
        response
            .message
            .as_deref()
            .unwrap_or("Application submitted successfully!")
    );
    if let Some(id) = &response.application_id {
        println!("Application ID: {id}");
    }
    for warning in response.warnings() {
        println!("Warning: {warning}");
    }
    Ok(())
}

fn history(action: HistoryCmd, mut drafts: DraftStore<FileStore>) -> Result<()> {
    match action {
        HistoryCmd::List => {
            let entries = drafts.history();
            if entries.is_empty() {
                println!("No submissions recorded");
            }
            for entry in entries {
                let outcome = if entry.success {
                    entry
                        .submission_result
                        .application_id
                        .unwrap_or_else(|| "submitted".into())
                } else {
                    format!(
                        "failed: {}",
                        entry.submission_result.error.unwrap_or_default()
                    )
                };
                println!("{}  {}  {}", entry.id, entry.timestamp, outcome);
            }
            Ok(())
        }
        HistoryCmd::Show { id } => {
            let entry = drafts
                .history_item(&id)
                .ok_or_else(|| eyre!("no history entry {id}"))?;
            print_json(&entry)
        }
        HistoryCmd::Clear => {
            if !drafts.clear_history() {
                bail!("history could not be cleared");
            }
            println!("History cleared");
            Ok(())
        }
        HistoryCmd::Cleanup => {
            println!("Removed {} old entries", drafts.cleanup_old_data());
            Ok(())
        }
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<ApplicationStatus>> {
    Ok(raw.map(str::parse::<ApplicationStatus>).transpose()?)
}

fn list_query(args: ListArgs) -> Result<ApplicationQuery> {
    Ok(ApplicationQuery {
        status: parse_status(args.status.as_deref())?,
        sort_field: args.sort.parse()?,
        sort_direction: if args.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
        page: args.page,
        per_page: args.per_page,
        search: args.search,
    })
}

fn applications(action: AdminCmd, ctx: &AppContext) -> Result<()> {
    match action {
        AdminCmd::List { records, args } => {
            let records: Vec<ApplicationRecord> = read_json(&records)?;
            let page = list_query(args)?.run(&records);
            for r in &page.items {
                println!(
                    "{:<20} {:<24} {:<8} {:<15} {}",
                    r.application_id,
                    r.student_name,
                    r.room_number,
                    r.status.as_str(),
                    r.submission_date
                );
            }
            println!(
                "page {}/{} ({} applications)",
                page.page,
                page.total_pages.max(1),
                page.total_items
            );
            Ok(())
        }
        AdminCmd::Stats { records } => {
            let records: Vec<ApplicationRecord> = read_json(&records)?;
            print_json(&admin::stats(&records))
        }
        AdminCmd::Export {
            records,
            format,
            status,
            out,
        } => {
            let records: Vec<ApplicationRecord> = read_json(&records)?;
            let status = parse_status(status.as_deref())?;
            let format = match format {
                FormatArg::Csv => ExportFormat::Csv,
                FormatArg::Json => ExportFormat::Json,
            };
            let selected = records
                .iter()
                .filter(|r| status.map_or(true, |s| r.status == s));
            let export = admin::export(selected, format, chrono::Utc::now())?;

            let dir = out.unwrap_or_else(|| ctx.path_context().exports_dir());
            fs::create_dir_all(&dir)?;
            let path = dir.join(&export.filename);
            fs::write(&path, &export.data)?;
            println!("Wrote {} ({})", path.display(), export.content_type);
            Ok(())
        }
        AdminCmd::BulkStatus {
            records: path,
            status,
            ids,
        } => {
            let mut records: Vec<ApplicationRecord> = read_json(&path)?;
            let status: ApplicationStatus = status.parse()?;
            let result = admin::bulk_update_status(&mut records, &ids, status)?;
            fs::write(&path, serde_json::to_string_pretty(&records)?)?;
            println!("Updated {} application(s) to {status}", result.updated_count);
            for id in result.missing {
                println!("Not found: {id}");
            }
            Ok(())
        }
    }
}
