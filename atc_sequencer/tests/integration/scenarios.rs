//! End-to-end tool-change scenarios on the recording bench.

use super::common::*;
use atc_common::machine::types::{MotionCommand, OperatorResponse};
use atc_common::tool::ToolNumber;
use atc_sequencer::report::{AbortReason, CycleOutcome};
use atc_sequencer::Phase;
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn test_rack_to_rack_round_trip() {
    let mut bench = Bench::new(3, 7);
    let report = bench.run().unwrap();
    let heights = bench.loaded.config.heights.clone();
    let feed = bench.loaded.config.motion.feed_rate_z;

    assert_eq!(report.outcome, CycleOutcome::Completed { tool: ToolNumber::new(7) });
    assert_eq!(bench.machine.current, ToolNumber::new(7));
    assert_eq!(bench.commits(), vec![ToolNumber::NONE, ToolNumber::new(7)]);

    let (x3, y3) = slot_xy(3);
    let (x7, y7) = slot_xy(7);
    assert_eq!(
        bench.motions(),
        vec![
            MotionCommand::rapid_z(heights.safe_z),
            MotionCommand::rapid_xy(x3, y3),
            MotionCommand::rapid_z(heights.tool_release_z),
            MotionCommand::feed_z(heights.eject_z(), feed),
            MotionCommand::rapid_z(heights.travel_z()),
            MotionCommand::rapid_xy(x7, y7),
            MotionCommand::rapid_z(heights.engage_approach_z()),
            MotionCommand::feed_z(heights.tool_release_z, feed),
            MotionCommand::rapid_z(heights.safe_z),
            MotionCommand::rapid_xy(ORIGIN.x, ORIGIN.y),
            MotionCommand::LoadToolOffset(ToolNumber::new(7)),
        ]
    );

    assert_eq!(
        report.phases,
        vec![
            Phase::SafetyCheck,
            Phase::StopSpindle,
            Phase::NormalizeActuators,
            Phase::RetractToSafeZ,
            Phase::ReleaseOldTool,
            Phase::AcquireNewTool,
            Phase::ReturnToOrigin,
            Phase::ReloadToolOffset,
            Phase::Finish,
        ]
    );

    // Rack extended once for the eject and stays out for the pickup.
    let extends = bench.events().iter().filter(|e| is_write(e, RACK, true)).count();
    assert_eq!(extends, 1);
    assert_eq!(report.elapsed, ms(3750 + 50 + 200 + 5 + 200 + 3750));
    assert!(!bench.events().contains(&Event::HaltDecel));
}

#[test]
fn test_eject_order_protects_pull_stud() {
    let mut bench = Bench::new(3, 7);
    bench.run().unwrap();
    let heights = bench.loaded.config.heights.clone();

    let descend = bench.position_of(|e| is_z_move_to(e, heights.tool_release_z)).unwrap();
    let extend = bench.position_of(|e| is_write(e, RACK, true)).unwrap();
    let open = bench.position_of(|e| is_write(e, CHUCK, true)).unwrap();
    let raise = bench.position_of(|e| is_z_move_to(e, heights.eject_z())).unwrap();
    assert!(descend < extend && extend < open && open < raise);

    let events = bench.events();
    assert_eq!(events[extend + 1], Event::Wait(ms(3750)));
    // Strain relief dwell sits between chuck open and the raise.
    assert_eq!(events[open + 1], Event::Wait(ms(50)));
    assert_eq!(raise, open + 2);
}

#[test]
fn test_overflow_placement_from_empty_chuck() {
    let mut bench = Bench::new(0, 15);
    let report = bench.run().unwrap();
    let park = bench.loaded.config.park.clone();

    assert_eq!(report.outcome, CycleOutcome::Completed { tool: ToolNumber::new(15) });
    assert_eq!(bench.commits(), vec![ToolNumber::new(15)]);

    // Chuck opens without any eject motion.
    assert!(bench.events().contains(&Event::Notify("No tool in chuck, opening chuck.".to_string())));
    let open = bench.position_of(|e| is_write(e, CHUCK, true)).unwrap();
    assert_eq!(bench.events()[open + 1], Event::Wait(ms(300)));
    assert!(!bench.motions().iter().any(|m| matches!(m, MotionCommand::Feed { .. })));
    assert!(!bench.events().iter().any(|e| is_write(e, RACK, true)));

    assert_eq!(
        bench.prompts(),
        vec![
            "Place tool into chuck. Click OK when you are ready to continue.".to_string(),
            "Verify that tool is in the spindle. Select OK to continue.".to_string(),
        ]
    );

    let park_xy = bench.position_of(|e| is_rapid_xy(e, park.x, park.y)).unwrap();
    let first_prompt = bench.position_of(|e| matches!(e, Event::Confirm(..))).unwrap();
    let close = bench.position_of(|e| is_write(e, CHUCK, false)).unwrap();
    let second_prompt = bench.position_after(first_prompt + 1, |e| matches!(e, Event::Confirm(..))).unwrap();
    let commit = bench.position_of(|e| matches!(e, Event::Commit(_))).unwrap();
    assert!(park_xy < first_prompt);
    assert!(first_prompt < close && close < second_prompt && second_prompt < commit);
}

#[test]
fn test_overflow_placement_cancel_keeps_bookkeeping() {
    let mut bench = Bench::new(0, 15).answers(&[OperatorResponse::Proceed, OperatorResponse::Cancel]);
    let report = bench.run().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Aborted(AbortReason::ManualLoadCancelled));
    assert!(bench.commits().is_empty());
    assert_eq!(bench.machine.current, ToolNumber::NONE);
    // Chuck was closed before the cancel; nothing is rewound afterwards.
    let close = bench.position_of(|e| is_write(e, CHUCK, false)).unwrap();
    let last_write = bench
        .events()
        .iter()
        .rposition(|e| matches!(e, Event::Write(..)))
        .unwrap();
    assert_eq!(close, last_write);
}

#[test]
fn test_cancel_ready_to_release_during_manual_removal() {
    let mut bench = Bench::new(20, 3).answers(&[OperatorResponse::Proceed, OperatorResponse::Cancel]);
    let report = bench.run().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Aborted(AbortReason::ManualRemovalCancelled));
    assert_eq!(bench.machine.current, ToolNumber::new(20));
    assert!(bench.commits().is_empty());
    assert!(!bench.events().iter().any(|e| matches!(e, Event::Write(p, _) if *p == CHUCK)));
    assert_eq!(bench.prompts().len(), 2);
    assert!(bench.prompts()[1].starts_with("When you are ready to release the tool"));
    assert_eq!(
        bench.events().last(),
        Some(&Event::Notify("Tool change cancelled by operator.".to_string()))
    );
    assert!(!bench.events().iter().any(|e| matches!(e, Event::HaltDecel | Event::HardStop)));
    assert_eq!(report.phases.last(), Some(&Phase::ReleaseOldTool));
}

#[test]
fn test_cancel_before_manual_removal_moves_nothing() {
    let mut bench = Bench::new(20, 3).answers(&[OperatorResponse::Cancel]);
    let report = bench.run().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Aborted(AbortReason::ManualRemovalCancelled));
    // Only the safe-Z retract happened before the prompt.
    assert_eq!(bench.motions().len(), 1);
    assert!(bench.prompts()[0].contains("Tool 20 is not in the ATC rack"));
}

#[test]
fn test_manual_removal_then_rack_pickup() {
    let mut bench = Bench::new(20, 2);
    let report = bench.run().unwrap();
    let heights = bench.loaded.config.heights.clone();

    assert!(report.outcome.is_completed());
    assert_eq!(bench.prompts().len(), 3);
    assert_eq!(bench.commits(), vec![ToolNumber::NONE, ToolNumber::new(2)]);

    // The rack was never extended by an eject, so the pickup extends it
    // and waits full travel before descending.
    let (x2, y2) = slot_xy(2);
    let xy = bench.position_of(|e| is_rapid_xy(e, x2, y2)).unwrap();
    let extend = bench.position_of(|e| is_write(e, RACK, true)).unwrap();
    let descend = bench.position_of(|e| is_z_move_to(e, heights.engage_approach_z())).unwrap();
    assert!(xy < extend && extend < descend);
    assert_eq!(bench.events()[extend + 1], Event::Wait(ms(3750)));
}

#[test]
fn test_empty_chuck_to_rack_pickup() {
    let mut bench = Bench::new(0, 4);
    let report = bench.run().unwrap();

    assert!(report.outcome.is_completed());
    assert_eq!(bench.commits(), vec![ToolNumber::new(4)]);
    let open = bench.position_of(|e| is_write(e, CHUCK, true)).unwrap();
    let extend = bench.position_of(|e| is_write(e, RACK, true)).unwrap();
    assert!(open < extend);
    // Rack retracted after the pickup.
    let retract = bench.position_of(|e| is_write(e, RACK, false)).unwrap();
    assert!(retract > extend);
}

#[test]
fn test_chuck_open_with_recorded_tool_resets() {
    let mut bench = Bench::new(5, 7).sensor(CHUCK, true);
    let report = bench.run().unwrap();

    assert_eq!(report.outcome, CycleOutcome::ResetRequired);
    assert_eq!(bench.machine.current, ToolNumber::NONE);
    assert!(bench.motions().is_empty());
    assert_eq!(
        report.phases,
        vec![Phase::SafetyCheck, Phase::StopSpindle, Phase::NormalizeActuators]
    );

    let events = bench.events();
    assert!(matches!(&events[0], Event::Confirm(text, _) if text.contains("tool set to 5")));
    assert_eq!(
        events[1..],
        [
            Event::Wait(ms(100)),
            Event::Write(CHUCK, false),
            Event::Wait(ms(500)),
            Event::Commit(ToolNumber::NONE),
            Event::Notify("ATC is reset and tool set to 0. Please run the tool change again.".to_string()),
            Event::HardStop,
        ]
    );
}

#[test]
fn test_declined_chuck_reset_aborts() {
    let mut bench = Bench::new(5, 7)
        .sensor(CHUCK, true)
        .answers(&[OperatorResponse::Cancel]);
    let report = bench.run().unwrap();

    assert_eq!(report.outcome, CycleOutcome::Aborted(AbortReason::ChuckResetDeclined));
    assert_eq!(bench.machine.current, ToolNumber::new(5));
    assert!(bench.hardware_untouched());
}

#[test]
fn test_rack_release_visits_slot_before_descent() {
    for current in 1..=10 {
        let mut bench = Bench::new(current, 12);
        bench.run().unwrap();
        let release_z = bench.loaded.config.heights.tool_release_z;

        let (x, y) = slot_xy(current);
        let xy = bench.position_of(|e| is_rapid_xy(e, x, y));
        let descend = bench.position_of(|e| is_z_move_to(e, release_z));
        assert!(
            matches!((xy, descend), (Some(a), Some(b)) if a < b),
            "tool {current}: slot XY must precede the descent"
        );
    }
}

#[test]
fn test_rack_pickup_commits_only_after_engage() {
    for requested in 1..=10 {
        let mut bench = Bench::new(0, requested);
        bench.run().unwrap();
        let release_z = bench.loaded.config.heights.tool_release_z;

        let close = bench.position_of(|e| is_write(e, CHUCK, false)).unwrap();
        let engage = bench.position_after(close, |e| is_z_move_to(e, release_z)).unwrap();
        let settle = bench.position_after(engage, |e| *e == Event::Wait(ms(200))).unwrap();
        let commit = bench
            .position_of(|e| *e == Event::Commit(ToolNumber::new(requested)))
            .unwrap();
        assert!(close < engage && engage < settle && settle < commit, "tool {requested}");
    }
}

#[test]
fn test_spindle_and_rack_waits_overlap() {
    let mut bench = Bench::new(3, 7).sensor(RACK, true);
    bench.machine.spindle = true;
    bench.run().unwrap();
    let safe_z = bench.loaded.config.heights.safe_z;

    assert_eq!(
        bench.events()[..6],
        [
            Event::StopSpindle,
            Event::Notify("Tool rack extended, retracting.".to_string()),
            Event::Write(RACK, false),
            Event::Wait(ms(100)),
            Event::Motion(MotionCommand::rapid_z(safe_z)),
            Event::Wait(ms(8900)),
        ]
    );
}

#[test]
fn test_spindle_only_waits_full_spin_down() {
    let mut bench = Bench::new(3, 7);
    bench.machine.spindle = true;
    bench.run().unwrap();

    let events = bench.events();
    assert_eq!(events[0], Event::StopSpindle);
    assert!(matches!(events[1], Event::Motion(_)));
    assert_eq!(events[2], Event::Wait(ms(9000)));
}

#[test]
fn test_extended_rack_only_waits_rack_travel() {
    let mut bench = Bench::new(3, 7).sensor(RACK, true);
    bench.run().unwrap();

    let events = bench.events();
    assert_eq!(events[2], Event::Wait(ms(100)));
    assert!(matches!(events[3], Event::Motion(_)));
    assert_eq!(events[4], Event::Wait(ms(3750)));
}
