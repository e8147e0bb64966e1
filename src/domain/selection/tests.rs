// Unit tests for the range selector

use super::*;

fn ms(value: u64) -> TimeSpec {
    TimeSpec::from_millis(value)
}

fn selector() -> RangeSelector {
    RangeSelector::new("demo.mp4", ms(20_000), ms(40)).unwrap()
}

fn assert_invariant(selector: &RangeSelector) {
    let state = selector.state();
    assert!(state.start < state.end, "{:?}", state);
    assert!(state.end <= state.media_duration, "{:?}", state);
    assert!(state.length() >= selector.min_gap(), "{:?}", state);
}

#[test]
fn test_new_selects_whole_media() {
    let state = selector().state();
    assert_eq!(state.start, TimeSpec::ZERO);
    assert_eq!(state.end, ms(20_000));
    assert_eq!(state.active_handle, None);
}

#[test]
fn test_new_rejects_media_shorter_than_gap() {
    assert!(matches!(
        RangeSelector::new("tiny.mp4", ms(10), ms(40)),
        Err(RangeError::ZeroLength { .. })
    ));
}

#[test]
fn test_move_without_drag_is_ignored() {
    let mut selector = selector();
    assert_eq!(selector.move_active(ms(5_000)), None);
    assert_eq!(selector.state().start, TimeSpec::ZERO);
}

#[test]
fn test_drag_start_handle() {
    let mut selector = selector();
    selector.begin_drag(Handle::Start);
    assert_eq!(selector.state().active_handle, Some(Handle::Start));
    assert_eq!(selector.move_active(ms(5_000)), Some(ms(5_000)));

    let end = selector.end_drag().unwrap();
    assert_eq!(end.handle, Handle::Start);
    assert_eq!(end.thumbnail_at, ms(5_000));
    assert_eq!(end.preview_range, (ms(5_000), ms(20_000)));
    assert_eq!(selector.state().active_handle, None);
    assert_eq!(selector.end_drag(), None);
}

#[test]
fn test_end_handle_clamps_at_start_plus_gap() {
    let mut selector = selector();
    selector.begin_drag(Handle::Start);
    selector.move_active(ms(8_000));
    selector.end_drag();

    selector.begin_drag(Handle::End);
    assert_eq!(selector.move_active(ms(3_000)), Some(ms(8_040)));
    assert_eq!(selector.state().end, ms(8_040));
    assert_invariant(&selector);
}

#[test]
fn test_start_handle_clamps_at_end_minus_gap() {
    let mut selector = selector();
    selector.begin_drag(Handle::End);
    selector.move_active(ms(6_000));
    selector.begin_drag(Handle::Start);
    assert_eq!(selector.move_active(ms(19_000)), Some(ms(5_960)));
    assert_invariant(&selector);
}

#[test]
fn test_moves_clamp_into_media() {
    let mut selector = selector();
    selector.begin_drag(Handle::End);
    assert_eq!(selector.move_active(ms(99_000)), Some(ms(20_000)));
    selector.begin_drag(Handle::Start);
    assert_eq!(selector.move_active(ms(99_000)), Some(ms(19_960)));
    assert_invariant(&selector);
}

#[test]
fn test_invariant_holds_for_move_sequences() {
    let mut selector = selector();
    // Deterministic pseudo-random walk over both handles
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for step in 0..2_000 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let handle = if step % 3 == 0 { Handle::End } else { Handle::Start };
        selector.begin_drag(handle);
        selector.move_active(ms(seed % 25_000));
        if step % 5 == 0 {
            selector.end_drag();
        }
        assert_invariant(&selector);
    }
}

#[test]
fn test_typed_times_out_of_bounds() {
    let mut selector = selector();
    assert!(matches!(
        selector.set_end(ms(20_001)),
        Err(RangeError::OutOfBounds { .. })
    ));
    assert_eq!(selector.set_end(ms(12_000)).unwrap(), ms(12_000));
    assert_eq!(selector.set_start(ms(5_000)).unwrap(), ms(5_000));
    // Typed start past the end snaps below it like a drag would
    assert_eq!(selector.set_start(ms(15_000)).unwrap(), ms(11_960));
    assert_invariant(&selector);
}

#[test]
fn test_commit_produces_request() {
    let mut selector = selector();
    selector.set_start(ms(5_000)).unwrap();
    selector.set_end(ms(12_000)).unwrap();

    let request = selector.commit(None).unwrap();
    assert_eq!(request.source(), Path::new("demo.mp4"));
    assert_eq!(request.start(), ms(5_000));
    assert_eq!(request.end(), ms(12_000));
    assert_eq!(request.destination(), None);

    // The selection survives the commit
    assert_eq!(selector.state().start, ms(5_000));
}

#[test]
fn test_commit_at_minimum_gap_succeeds() {
    let mut selector = selector();
    selector.set_start(ms(10_000)).unwrap();
    selector.set_end(ms(0)).unwrap();
    assert_eq!(selector.state().length(), ms(40));
    assert!(selector.commit(Some(PathBuf::from("out.mp4"))).is_ok());
}
