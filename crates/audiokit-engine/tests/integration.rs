//! End-to-end tests driving the controller and scheduler together.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use audiokit_core::{AudioBlock, BlockFormat, ParamValue};
use audiokit_engine::{
    Controller, EngineError, IoFault, NodeId, NodeKind, ParamMap, Scheduler, SchedulerState,
    build_engine,
};

fn format() -> BlockFormat {
    BlockFormat::new(44100.0, 256, 2)
}

fn constant(value: f32) -> AudioBlock {
    let format = format();
    let mut block = AudioBlock::for_format(&format);
    for ch in 0..format.channels {
        block.channel_mut(ch).fill(value);
    }
    block
}

fn run(scheduler: &mut Scheduler, input: &AudioBlock) -> AudioBlock {
    let mut output = AudioBlock::for_format(&scheduler.format());
    scheduler.process_block(input, &mut output);
    output
}

/// in → f → out with two channels and a 1 kHz cutoff.
fn filter_chain() -> (Controller, Scheduler) {
    let (controller, scheduler) = build_engine(format()).unwrap();
    controller
        .add_node(NodeKind::Input, "in", &ParamMap::new().with("channels", 2))
        .unwrap();
    controller
        .add_node(NodeKind::Filter, "f", &ParamMap::new().with("cutoff", 1000))
        .unwrap();
    controller
        .add_node(NodeKind::Output, "out", &ParamMap::new().with("channels", 2))
        .unwrap();
    controller.connect("in", "f").unwrap();
    controller.connect("f", "out").unwrap();
    (controller, scheduler)
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| (*id).to_owned()).collect()
}

fn pairs(edges: &[(&str, &str)]) -> Vec<(String, String)> {
    edges
        .iter()
        .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
        .collect()
}

#[test]
fn filter_chain_is_fully_active_after_one_block() {
    let (controller, mut scheduler) = filter_chain();
    assert!(controller.get_metrics().active_nodes.is_empty());

    run(&mut scheduler, &constant(0.1));

    let metrics = controller.get_metrics();
    assert_eq!(metrics.active_nodes, set(&["in", "f", "out"]));
    assert_eq!(metrics.blocks_processed, 1);
    assert_eq!(metrics.generation, 2);
    assert_eq!(metrics.state, SchedulerState::Idle);
    assert_eq!(
        controller.list_connections(),
        pairs(&[("in", "f"), ("f", "out")])
    );
}

#[test]
fn closing_the_loop_is_rejected_and_changes_nothing() {
    let (controller, _scheduler) = filter_chain();
    let err = controller.connect("out", "in").unwrap_err();
    assert_eq!(
        err,
        EngineError::CycleDetected {
            from: NodeId::from("out"),
            to: NodeId::from("in"),
        }
    );
    assert_eq!(
        controller.list_connections(),
        pairs(&[("in", "f"), ("f", "out")])
    );
}

#[test]
fn topology_errors_leave_the_graph_intact() {
    let (controller, _scheduler) = filter_chain();

    assert_eq!(
        controller.add_node(NodeKind::Delay, "f", &ParamMap::new()),
        Err(EngineError::DuplicateId(NodeId::from("f")))
    );
    assert!(matches!(
        controller.add_node(
            NodeKind::Delay,
            "d",
            &ParamMap::new().with("feedback", 1.0)
        ),
        Err(EngineError::InvalidParameter { .. })
    ));
    assert_eq!(
        controller.connect("f", "ghost"),
        Err(EngineError::UnknownNode(NodeId::from("ghost")))
    );
    assert_eq!(
        controller.remove_node("ghost"),
        Err(EngineError::UnknownNode(NodeId::from("ghost")))
    );
    assert_eq!(
        controller.set_parameter("ghost", "cutoff", 100.0),
        Err(EngineError::UnknownNode(NodeId::from("ghost")))
    );
    assert!(matches!(
        controller.set_parameter("f", "cutoff", f32::NAN),
        Err(EngineError::InvalidParameter { .. })
    ));

    let ids: Vec<String> = controller.list_nodes().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["in", "f", "out"]);
    assert_eq!(controller.list_connections().len(), 2);
}

#[test]
fn list_nodes_reports_kinds_and_values() {
    let (controller, _scheduler) = filter_chain();
    controller.set_parameter("f", "resonance", 2.0).unwrap();

    let nodes = controller.list_nodes();
    assert_eq!(nodes[1].kind, NodeKind::Filter);
    assert_eq!(
        nodes[1].params,
        vec![
            ("cutoff", ParamValue::Float(1000.0)),
            ("resonance", ParamValue::Float(2.0)),
        ]
    );
    assert_eq!(nodes[0].params, vec![("channels", ParamValue::Int(2))]);
}

#[test]
fn non_finite_device_input_silences_only_the_input_node() {
    let (controller, mut scheduler) = filter_chain();
    let mut input = constant(0.1);
    input.channel_mut(1)[7] = f32::NAN;

    let output = run(&mut scheduler, &input);
    assert_eq!(output.peak(), 0.0);

    let metrics = controller.get_metrics();
    assert_eq!(metrics.active_nodes, set(&["f", "out"]));
    assert_eq!(metrics.faults["in"], 1);
    assert_eq!(metrics.faults["f"], 0);
    assert_eq!(metrics.level["in"], 0.0);

    // the node recovers as soon as the input is clean again
    run(&mut scheduler, &constant(0.1));
    let metrics = controller.get_metrics();
    assert_eq!(metrics.active_nodes, set(&["in", "f", "out"]));
    assert_eq!(metrics.faults["in"], 1);
}

#[test]
fn staged_parameters_land_on_the_next_block() {
    let (controller, mut scheduler) = build_engine(format()).unwrap();
    controller
        .add_node(NodeKind::Input, "in", &ParamMap::new())
        .unwrap();
    controller
        .add_node(NodeKind::Output, "out", &ParamMap::new())
        .unwrap();
    controller.connect("in", "out").unwrap();

    let input = constant(0.5);
    assert_eq!(run(&mut scheduler, &input), input);

    controller.set_parameter("out", "channels", 1).unwrap();
    let output = run(&mut scheduler, &input);
    assert!(output.channel(0).iter().all(|&s| s == 0.5));
    assert!(output.channel(1).iter().all(|&s| s == 0.0));
}

#[test]
fn retired_plans_are_freed_between_blocks() {
    let (controller, mut scheduler) = build_engine(format()).unwrap();
    controller
        .add_node(NodeKind::Input, "in", &ParamMap::new())
        .unwrap();
    controller
        .add_node(NodeKind::Output, "out", &ParamMap::new())
        .unwrap();
    controller.connect("in", "out").unwrap();
    assert_eq!(controller.pending_reclaim(), 0);

    run(&mut scheduler, &constant(0.1));
    controller.remove_node("out").unwrap();
    assert_eq!(controller.pending_reclaim(), 0);
    assert_eq!(controller.collect_garbage(), 0);
    assert!(controller.list_connections().is_empty());
}

#[test]
fn edits_before_the_first_block_do_not_accumulate_plans() {
    let (controller, mut scheduler) = build_engine(format()).unwrap();
    controller
        .add_node(NodeKind::Input, "in", &ParamMap::new())
        .unwrap();
    controller
        .add_node(NodeKind::Output, "out", &ParamMap::new())
        .unwrap();
    controller.connect("in", "out").unwrap();

    for i in 0..300 {
        let id = format!("echo{i}");
        controller.add_node(NodeKind::Delay, &id, &ParamMap::new()).unwrap();
        controller.connect("in", &id).unwrap();
        controller.remove_node(&id).unwrap();
        assert_eq!(controller.pending_reclaim(), 0, "after edit {i}");
    }
    assert_eq!(scheduler.blocks_processed(), 0);
    assert_eq!(controller.state(), SchedulerState::Idle);

    let input = constant(0.25);
    assert_eq!(run(&mut scheduler, &input), input);
}

#[test]
fn unconnected_nodes_go_live_on_explicit_rebuild() {
    let (controller, mut scheduler) = build_engine(format()).unwrap();
    controller
        .add_node(NodeKind::Compressor, "c", &ParamMap::new())
        .unwrap();
    run(&mut scheduler, &constant(0.1));
    assert!(controller.get_metrics().active_nodes.is_empty());

    assert_eq!(controller.rebuild_plan().unwrap(), 1);
    run(&mut scheduler, &constant(0.1));
    assert_eq!(controller.get_metrics().active_nodes, set(&["c"]));
}

#[test]
fn stop_silences_and_is_terminal() {
    let (controller, mut scheduler) = filter_chain();
    run(&mut scheduler, &constant(0.1));
    controller.stop();
    assert_eq!(controller.state(), SchedulerState::Stopped);

    let mut output = constant(1.0);
    assert_eq!(
        scheduler.process_block(&constant(0.1), &mut output),
        SchedulerState::Stopped
    );
    assert_eq!(output.peak(), 0.0);
    assert_eq!(scheduler.blocks_processed(), 1);
}

#[test]
fn only_unrecoverable_io_faults_stop_the_scheduler() {
    let (controller, mut scheduler) = filter_chain();
    let reporter = scheduler.io_faults();

    reporter.report(IoFault::Underrun);
    run(&mut scheduler, &constant(0.1));
    assert_eq!(controller.state(), SchedulerState::Idle);

    reporter.report(IoFault::DeviceLost);
    let metrics = controller.get_metrics();
    assert_eq!(metrics.io_faults, 2);
    assert_eq!(metrics.state, SchedulerState::Stopped);
    assert_eq!(run(&mut scheduler, &constant(0.1)).peak(), 0.0);
}

#[test]
fn edits_race_safely_with_the_audio_thread() {
    let (controller, mut scheduler) = build_engine(BlockFormat::new(44100.0, 64, 2)).unwrap();
    controller
        .add_node(NodeKind::Input, "in", &ParamMap::new())
        .unwrap();
    controller
        .add_node(NodeKind::Output, "out", &ParamMap::new())
        .unwrap();
    controller.connect("in", "out").unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let audio = {
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let format = scheduler.format();
            let mut input = AudioBlock::for_format(&format);
            for ch in 0..format.channels {
                input.channel_mut(ch).fill(0.3);
            }
            let mut output = AudioBlock::for_format(&format);
            while !done.load(Ordering::Acquire) {
                scheduler.process_block(&input, &mut output);
                assert!(output.is_finite());
                assert!(output.peak() <= 1.0);
            }
            scheduler
        })
    };

    for i in 0..200 {
        let id = format!("fx{i}");
        let kind = [NodeKind::Filter, NodeKind::Compressor, NodeKind::Delay][i % 3];
        controller.add_node(kind, &id, &ParamMap::new()).unwrap();
        controller.connect("in", &id).unwrap();
        controller.connect(&id, "out").unwrap();
        let name = controller.describe(kind)[0].name;
        let default = controller.describe(kind)[0].default;
        controller.set_parameter(&id, name, default).unwrap();
        let _ = controller.get_metrics();
        controller.remove_node(&id).unwrap();
    }

    done.store(true, Ordering::Release);
    let mut scheduler = audio.join().unwrap();
    run(&mut scheduler, &constant(0.1));
    controller.collect_garbage();
    assert_eq!(controller.pending_reclaim(), 0);
    assert_eq!(controller.list_connections(), pairs(&[("in", "out")]));
}
