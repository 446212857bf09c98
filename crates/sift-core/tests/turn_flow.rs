//! End-to-end turn flow: engine events applied to the conversation store.

use std::sync::Arc;

use sift_core::config::TimingConfig;
use sift_core::scenario;
use sift_core::turn::{
    ConversationStore, MessageId, MessagePatch, Stage, StepStatus, TurnEngine, TurnEvent,
    TurnEventRx,
};

/// Applies a turn event to the store the way the TUI reducer does.
fn apply(store: &mut ConversationStore, id: MessageId, event: &TurnEvent) {
    let patch = match event {
        TurnEvent::TurnStarted | TurnEvent::TurnCompleted => return,
        TurnEvent::StageChanged { stage } => MessagePatch {
            stage: Some(*stage),
            ..Default::default()
        },
        TurnEvent::ThinkingUpdate { text } => MessagePatch {
            thinking: Some(text.clone()),
            ..Default::default()
        },
        TurnEvent::ReplyUpdate { text } => MessagePatch {
            text: Some(text.clone()),
            ..Default::default()
        },
        TurnEvent::StepsUpdate { steps } => MessagePatch {
            steps: Some(steps.clone()),
            ..Default::default()
        },
        TurnEvent::ReportReady { report } => MessagePatch {
            final_report: Some(report.clone()),
            ..Default::default()
        },
    };
    store.patch_agent(id, patch).unwrap();
}

async fn drain(rx: &mut TurnEventRx) -> Vec<Arc<TurnEvent>> {
    let mut events = Vec::new();
    while let Some(ev) = rx.recv().await {
        let done = matches!(*ev, TurnEvent::TurnCompleted);
        events.push(ev);
        if done {
            break;
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn full_turn_reaches_completed_with_all_content() {
    let mut store = ConversationStore::with_welcome(scenario::WELCOME_TEXT);
    let mut engine = TurnEngine::new();

    store.append_user("Analyze the beverage category");
    let script = scenario::demo_turn();
    let (id, mut rx) = engine.start_turn(script.clone(), TimingConfig::default()).unwrap();
    store.append_agent_placeholder(id).unwrap();
    assert!(engine.is_active(id));

    let events = drain(&mut rx).await;
    for ev in &events {
        apply(&mut store, id, ev);
    }
    engine.finish(id);

    let msg = store.messages().last().unwrap();
    assert_eq!(msg.stage, Stage::Completed);
    assert_eq!(msg.thinking, script.thinking);
    assert_eq!(msg.text, script.reply);
    assert_eq!(msg.steps.len(), script.steps.len());
    assert!(msg.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert!(msg.final_report.is_some());
    assert!(!engine.has_active_turn());
    assert!(!engine.is_active(id));
}

#[tokio::test(start_paused = true)]
async fn stages_advance_in_order_without_regression() {
    let mut engine = TurnEngine::new();
    let (_id, mut rx) = engine
        .start_turn(scenario::demo_turn(), TimingConfig::instant())
        .unwrap();

    let events = drain(&mut rx).await;

    assert!(matches!(*events[0], TurnEvent::TurnStarted));
    assert!(matches!(**events.last().unwrap(), TurnEvent::TurnCompleted));

    let stages: Vec<Stage> = events
        .iter()
        .filter_map(|ev| match **ev {
            TurnEvent::StageChanged { stage } => Some(stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![Stage::Speaking, Stage::WorkflowRunning, Stage::Completed]
    );

    // The report lands before the terminal stage change.
    let report_pos = events
        .iter()
        .position(|ev| matches!(**ev, TurnEvent::ReportReady { .. }))
        .unwrap();
    let completed_pos = events
        .iter()
        .position(|ev| matches!(**ev, TurnEvent::StageChanged { stage: Stage::Completed }))
        .unwrap();
    assert!(report_pos < completed_pos);
}

#[tokio::test(start_paused = true)]
async fn step_snapshots_respect_the_wavefront() {
    let mut engine = TurnEngine::new();
    let (_id, mut rx) = engine
        .start_turn(scenario::demo_turn(), TimingConfig::instant())
        .unwrap();

    let events = drain(&mut rx).await;
    let snapshots: Vec<_> = events
        .iter()
        .filter_map(|ev| match &**ev {
            TurnEvent::StepsUpdate { steps } => Some(steps.clone()),
            _ => None,
        })
        .collect();

    // Two snapshots per step.
    assert_eq!(snapshots.len(), 10);
    for snap in &snapshots {
        assert!(sift_core::turn::workflow::wavefront_ok(snap));
    }
    let last = snapshots.last().unwrap();
    assert!(last.iter().all(|s| s.status == StepStatus::Completed));
    assert!(last.iter().all(|s| s.elapsed_ms.is_some()));
}

#[tokio::test(start_paused = true)]
async fn second_turn_while_active_is_rejected() {
    let mut engine = TurnEngine::new();
    let (id, mut rx) = engine
        .start_turn(scenario::demo_turn(), TimingConfig::default())
        .unwrap();

    let err = engine
        .start_turn(scenario::demo_turn(), TimingConfig::default())
        .unwrap_err();
    assert_eq!(err, sift_core::turn::TurnError::AlreadyActive { active: id });

    // The first turn is unaffected.
    drain(&mut rx).await;
    engine.finish(id);
    assert!(engine.start_turn(scenario::demo_turn(), TimingConfig::default()).is_ok());
}

#[tokio::test(start_paused = true)]
async fn cancelled_turn_goes_silent_mid_workflow() {
    let mut engine = TurnEngine::new();
    let timing = TimingConfig {
        thinking_cadence_ms: 0,
        reply_cadence_ms: 0,
        thinking_settle_ms: 0,
        reply_settle_ms: 0,
    };
    let (id, mut rx) = engine.start_turn(scenario::demo_turn(), timing).unwrap();

    // Drain until the first step starts processing.
    let mut saw_processing = false;
    while let Some(ev) = rx.recv().await {
        if let TurnEvent::StepsUpdate { steps } = &*ev
            && steps[0].status == StepStatus::Processing
        {
            saw_processing = true;
            break;
        }
        assert!(!matches!(*ev, TurnEvent::TurnCompleted));
    }
    assert!(saw_processing);

    engine.cancel_active();
    assert!(!engine.is_active(id));
    assert!(!engine.has_active_turn());

    // No completion, no further step updates: the channel just closes.
    while let Some(ev) = rx.recv().await {
        match &*ev {
            TurnEvent::TurnCompleted | TurnEvent::ReportReady { .. } => {
                panic!("cancelled turn must not complete")
            }
            TurnEvent::StepsUpdate { steps } => {
                assert!(steps.iter().all(|s| s.status != StepStatus::Completed));
            }
            _ => {}
        }
    }

    // The slot is free for the next turn.
    assert!(engine.start_turn(scenario::demo_turn(), timing).is_ok());
}
