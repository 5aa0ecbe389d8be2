use petromatch_core::{update, DashboardState, Msg};

#[test]
fn update_is_noop() {
    let state = DashboardState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
