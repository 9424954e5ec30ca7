use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use walker_core::{
    update, ControllerSettings, ControllerState, Effect, JobEvent, Msg, PageTotal, Record, Tone,
};

const HOST_URL: &str = "https://coretaxdjp.pajak.go.id/e-faktur/output";

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn running(settings: ControllerSettings) -> ControllerState {
    let (state, _) = update(
        ControllerState::new(settings),
        Msg::StartClicked {
            tab_url: HOST_URL.to_string(),
            now: at(0),
        },
    );
    state
}

#[test]
fn progress_renders_known_and_unknown_totals() {
    let state = running(ControllerSettings::default());

    let (mut state, effects) = update(
        state,
        Msg::Relayed {
            event: JobEvent::Progress {
                page: 2,
                total: PageTotal::Unknown,
            },
            now: at(10),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().status.text, "Reading page 2...");
    assert!(state.consume_dirty());

    let (state, _) = update(
        state,
        Msg::Relayed {
            event: JobEvent::Progress {
                page: 3,
                total: PageTotal::Known(7),
            },
            now: at(20),
        },
    );
    assert_eq!(state.view().status.text, "Reading page 3/7...");
    assert!(state.view().running);
}

#[test]
fn completion_restores_records_and_auto_exports() {
    let state = running(ControllerSettings::default());
    let records = vec![Record::default(); 5];

    let (state, effects) = update(
        state,
        Msg::Relayed {
            event: JobEvent::Completed {
                records: records.clone(),
            },
            now: at(60),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Export {
            records,
            timestamp: at(60),
        }]
    );
    let view = state.view();
    assert!(!view.running);
    assert!(view.start_enabled);
    assert_eq!(view.record_count, 5);
    assert_eq!(state.completed_at(), Some(at(60)));
}

#[test]
fn completion_without_auto_export_only_updates_view() {
    let settings = ControllerSettings {
        auto_export: false,
        ..ControllerSettings::default()
    };
    let state = running(settings);

    let (state, effects) = update(
        state,
        Msg::Relayed {
            event: JobEvent::Completed {
                records: vec![Record::default(); 2],
            },
            now: at(60),
        },
    );

    assert!(effects.is_empty());
    assert!(state.view().export_enabled);
    assert_eq!(state.view().status.text, "Walk finished! Found 2 records");
}

#[test]
fn empty_completion_does_not_export() {
    let state = running(ControllerSettings::default());

    let (state, effects) = update(
        state,
        Msg::Relayed {
            event: JobEvent::Completed { records: vec![] },
            now: at(60),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.view().export_enabled);
}

#[test]
fn failure_reenables_start() {
    let state = running(ControllerSettings::default());

    let (state, effects) = update(
        state,
        Msg::Relayed {
            event: JobEvent::Failed {
                reason: "next-page control not found".to_string(),
            },
            now: at(60),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.start_enabled);
    assert_eq!(view.status.tone, Tone::Error);
    assert_eq!(view.status.text, "Walk failed: next-page control not found");
}
