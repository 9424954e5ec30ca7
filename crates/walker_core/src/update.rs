use chrono::{DateTime, Utc};

use crate::elapsed::time_ago;
use crate::view_model::StatusLine;
use crate::{Ack, ControllerState, Effect, ExportReport, JobEvent, JobState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ControllerState, msg: Msg) -> (ControllerState, Vec<Effect>) {
    let effects = match msg {
        Msg::Opened { stored, now } => {
            reconcile(&mut state, stored, now);
            Vec::new()
        }
        Msg::StartClicked { tab_url, now } => start(&mut state, &tab_url, now),
        Msg::StartAcknowledged(result) => match result {
            Ok(Ack { success: true, .. }) => {
                state.set_status(StatusLine::info("Walk started..."));
                Vec::new()
            }
            Ok(Ack { message, .. }) => {
                let reason = message.unwrap_or_else(|| "could not start walk".to_string());
                start_failed(&mut state, &reason)
            }
            Err(reason) => start_failed(&mut state, &reason),
        },
        Msg::ResetClicked { tab_url } => {
            if !state.is_target_url(&tab_url) {
                wrong_host(&mut state);
                return (state, Vec::new());
            }
            if state.reset_in_flight() {
                return (state, Vec::new());
            }
            begin_reset(&mut state, "Resetting and reloading the page...")
        }
        Msg::ResetAcknowledged(result) => {
            state.set_reset_in_flight(false);
            match result {
                Ok(Ack { success: true, .. }) => {
                    state.set_status(StatusLine::info("Page will reload..."));
                }
                Ok(Ack { message, .. }) => {
                    let reason = message.unwrap_or_else(|| "reset refused".to_string());
                    state.set_status(StatusLine::error(format!("Error: {reason}")));
                }
                Err(reason) => {
                    state.set_status(StatusLine::error(format!("Error: {reason}")));
                }
            }
            Vec::new()
        }
        Msg::ClearClicked => {
            if state.is_running() {
                state.set_status(StatusLine::error("A walk is running; nothing cleared"));
                Vec::new()
            } else if state.records().is_empty() {
                state.set_status(StatusLine::info("No data to clear"));
                Vec::new()
            } else {
                state.clear_records();
                state.set_status(StatusLine::success("Data cleared"));
                vec![Effect::ClearStoredRecords]
            }
        }
        Msg::ExportClicked { now } => request_export(&mut state, now),
        Msg::ExportFinished { result, tab_url } => export_finished(&mut state, result, tab_url),
        Msg::Relayed { event, now } => relayed(&mut state, event, now),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn reconcile(state: &mut ControllerState, stored: JobState, now: DateTime<Utc>) {
    if stored.running {
        state.mark_running(stored.started_at);
        let status = match stored.started_at {
            Some(started) => format!("Walk in progress... (started {})", time_ago(started, now)),
            None => "Walk in progress...".to_string(),
        };
        state.set_status(StatusLine::info(status));
    } else if !stored.records.is_empty() {
        state.mark_idle();
        let count = stored.records.len();
        let completed_at = stored.completed_at;
        state.restore_records(stored.records, completed_at);
        let status = match completed_at {
            Some(done) => format!("Data available ({})", time_ago(done, now)),
            None => format!("{count} records available"),
        };
        state.set_status(StatusLine::success(status));
    } else {
        state.mark_idle();
        state.set_status(StatusLine::info("Ready"));
    }
}

fn start(state: &mut ControllerState, tab_url: &str, now: DateTime<Utc>) -> Vec<Effect> {
    if state.is_running() {
        state.set_status(StatusLine::error("A walk is already running"));
        return Vec::new();
    }
    if !state.is_target_url(tab_url) {
        wrong_host(state);
        return Vec::new();
    }

    state.clear_records();
    state.mark_running(Some(now));
    state.set_status(StatusLine::info("Sending start command..."));
    vec![
        Effect::ClearStoredRecords,
        Effect::MarkRunning { started_at: now },
        Effect::SendStart,
    ]
}

fn start_failed(state: &mut ControllerState, reason: &str) -> Vec<Effect> {
    state.mark_idle();
    state.set_status(StatusLine::error(format!("Error: {reason}")));
    vec![Effect::MarkIdle]
}

fn begin_reset(state: &mut ControllerState, status: &str) -> Vec<Effect> {
    state.set_reset_in_flight(true);
    state.clear_records();
    state.mark_idle();
    state.set_status(StatusLine::info(status));
    vec![Effect::ClearStore, Effect::SendReset]
}

fn wrong_host(state: &mut ControllerState) {
    let host = state.settings().target_host.clone();
    state.set_status(StatusLine::error(format!("Error: open {host} first")));
}

fn request_export(state: &mut ControllerState, now: DateTime<Utc>) -> Vec<Effect> {
    if state.is_running() {
        state.set_status(StatusLine::error("A walk is running; wait for it to finish"));
        return Vec::new();
    }
    if state.records().is_empty() {
        state.set_status(StatusLine::error("No data to export"));
        return Vec::new();
    }
    if state.export_in_flight() {
        return Vec::new();
    }

    state.set_export_in_flight(true);
    state.set_status(StatusLine::info("Building spreadsheet..."));
    vec![Effect::Export {
        records: state.records().to_vec(),
        timestamp: state.completed_at().unwrap_or(now),
    }]
}

fn export_finished(
    state: &mut ControllerState,
    result: Result<ExportReport, String>,
    tab_url: Option<String>,
) -> Vec<Effect> {
    state.set_export_in_flight(false);
    let report = match result {
        Ok(report) => report,
        Err(reason) => {
            state.set_status(StatusLine::error(format!("Export failed: {reason}")));
            return Vec::new();
        }
    };

    let exported = format!(
        "Exported {} records to {}",
        report.row_count, report.file_name
    );
    let on_target = tab_url.as_deref().is_some_and(|url| state.is_target_url(url));
    if on_target && !state.reset_in_flight() {
        begin_reset(state, &format!("{exported}; resetting the page..."))
    } else {
        state.set_status(StatusLine::success(exported));
        Vec::new()
    }
}

fn relayed(state: &mut ControllerState, event: JobEvent, now: DateTime<Utc>) -> Vec<Effect> {
    match event {
        JobEvent::Completed { records } => {
            let count = records.len();
            state.mark_idle();
            state.restore_records(records, Some(now));
            state.set_status(StatusLine::success(format!(
                "Walk finished! Found {count} records"
            )));
            if state.settings().auto_export && count > 0 {
                request_export(state, now)
            } else {
                Vec::new()
            }
        }
        JobEvent::Failed { reason } => {
            state.mark_idle();
            state.set_status(StatusLine::error(format!("Walk failed: {reason}")));
            Vec::new()
        }
        JobEvent::Progress { page, total } => {
            let page_info = match total {
                crate::PageTotal::Known(total) => format!("{page}/{total}"),
                crate::PageTotal::Unknown => page.to_string(),
            };
            state.set_status(StatusLine::info(format!("Reading page {page_info}...")));
            Vec::new()
        }
    }
}
