use walker_core::{update, ControllerSettings, ControllerState, Msg};

#[test]
fn update_is_noop() {
    let state = ControllerState::new(ControllerSettings::default());
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
