mod common;

use common::*;
use council::{Hotkey, InputMode, Message, ModeSwitch, Presentation, ShutdownPath};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn switching_stops_the_old_loop() {
    let table = Table::new(&["ALICE", "BOB"], InputMode::Voice);
    let keyboard = Arc::new(FakeKeyboard::default());
    let (io, tx) = table.human_io(keyboard.clone(), Default::default(), "");
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;
    assert_eq!(modes.live_mode().await, Some(InputMode::Voice));

    eventually("the keyboard to be polled", || keyboard.polls() > 0).await;
    assert!(!modes.switch(InputMode::Voice).await);

    assert!(modes.switch(InputMode::Text).await);
    assert_eq!(table.ctx.mode(), InputMode::Text);
    assert_eq!(modes.live_mode().await, Some(InputMode::Text));
    let frozen = keyboard.polls();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(keyboard.polls(), frozen, "voice loop still polling");

    // typed lines now reach the agents under the text label
    tx.send("typed".into()).unwrap();
    eventually_async("the line to land", || async {
        table.ctx.transcript(0).await.unwrap().last() == &Message::user("HUMAN_TEXT", "typed")
    })
    .await;

    assert!(modes.switch(InputMode::Voice).await);
    eventually("voice polling to resume", || keyboard.polls() > frozen).await;
    assert_eq!(
        table
            .presenter
            .count(|e| matches!(e, Presentation::Mode { .. })),
        2
    );

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}

#[tokio::test]
async fn push_to_talk_fans_out_the_transcript() {
    let table = Table::new(&["ALICE", "BOB"], InputMode::Voice);
    let keyboard = Arc::new(FakeKeyboard::default());
    let recorder = Arc::new(FakeRecorder::default());
    let (io, _tx) = table.human_io(keyboard.clone(), recorder.clone(), " good evening ");
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;

    keyboard.press(Hotkey::StartRecord);
    eventually("recording to start", || {
        recorder.begins.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(table.ctx.is_paused());
    keyboard.release(Hotkey::StartRecord);
    keyboard.press(Hotkey::StopRecord);
    tokio::time::sleep(Duration::from_millis(20)).await;
    keyboard.release(Hotkey::StopRecord);

    eventually("a gate to be raised", || table.raised_gates().len() == 1).await;
    for i in 0..2 {
        let t = table.ctx.transcript(i).await.unwrap();
        assert_eq!(t.last().render(), "[HUMAN_VOICE] good evening");
    }
    assert!(!table.ctx.is_paused());
    assert_eq!(recorder.finishes.load(Ordering::SeqCst), 1);
    assert_eq!(
        table
            .presenter
            .count(|e| matches!(e, Presentation::Recording { .. })),
        2
    );

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}

#[tokio::test]
async fn blank_transcript_still_hands_over() {
    let table = Table::new(&["ALICE", "BOB"], InputMode::Voice);
    let keyboard = Arc::new(FakeKeyboard::default());
    let (io, _tx) = table.human_io(keyboard.clone(), Default::default(), "   ");
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;

    keyboard.press(Hotkey::StartRecord);
    eventually("pause to be set", || table.ctx.is_paused()).await;
    keyboard.release(Hotkey::StartRecord);
    keyboard.press(Hotkey::StopRecord);
    tokio::time::sleep(Duration::from_millis(20)).await;
    keyboard.release(Hotkey::StopRecord);

    eventually("a gate to be raised", || table.raised_gates().len() == 1).await;
    assert!(!table.ctx.is_paused());
    for i in 0..2 {
        assert!(table.ctx.transcript(i).await.unwrap().is_empty());
    }
    assert!(table.history.saved.lock().unwrap().is_empty());

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}

#[tokio::test]
async fn hotkeys_pause_and_pick_agents() {
    let table = Table::new(&["ALICE", "BOB", "CAROL"], InputMode::Voice);
    let keyboard = Arc::new(FakeKeyboard::default());
    let (io, _tx) = table.human_io(keyboard.clone(), Default::default(), "");
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;

    keyboard.press(Hotkey::PauseAll);
    eventually("pause", || table.ctx.is_paused()).await;
    keyboard.release(Hotkey::PauseAll);
    assert!(table.raised_gates().is_empty());

    keyboard.press(Hotkey::Agent(2));
    eventually("carol's gate", || table.raised_gates() == vec![2]).await;
    keyboard.release(Hotkey::Agent(2));
    assert!(!table.ctx.is_paused());

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}

#[tokio::test]
async fn switching_away_mid_recording_unpauses() {
    let table = Table::new(&["ALICE"], InputMode::Voice);
    let keyboard = Arc::new(FakeKeyboard::default());
    let recorder = Arc::new(FakeRecorder::default());
    let (io, _tx) = table.human_io(keyboard.clone(), recorder.clone(), "ignored");
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;

    keyboard.press(Hotkey::StartRecord);
    eventually("recording to start", || {
        recorder.begins.load(Ordering::SeqCst) == 1
    })
    .await;
    modes.switch(InputMode::Text).await;

    assert_eq!(recorder.finishes.load(Ordering::SeqCst), 1);
    assert!(!table.ctx.is_paused());
    assert!(table.ctx.transcript(0).await.unwrap().is_empty());

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}

#[tokio::test]
async fn slow_old_loop_does_not_hold_up_the_switch() {
    let table = Table::new(&["ALICE", "BOB"], InputMode::Voice);
    let keyboard = Arc::new(FakeKeyboard::default());
    let transcriber = Arc::new(SlowTranscriber::new("late words", Duration::from_millis(400)));
    let (io, tx) = table.human_io_with(keyboard.clone(), Default::default(), transcriber.clone());
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;

    keyboard.press(Hotkey::StartRecord);
    eventually("pause to be set", || table.ctx.is_paused()).await;
    keyboard.release(Hotkey::StartRecord);
    keyboard.press(Hotkey::StopRecord);
    tokio::time::sleep(Duration::from_millis(20)).await;
    keyboard.release(Hotkey::StopRecord);
    eventually("transcription to start", || transcriber.calls() == 1).await;

    // the voice loop is inside the transcriber and misses the join timeout
    let started = Instant::now();
    assert!(modes.switch(InputMode::Text).await);
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(modes.live_mode().await, Some(InputMode::Text));

    tx.send("typed".into()).unwrap();
    eventually_async("the typed line to land", || async {
        table.ctx.transcript(0).await.unwrap().last() == &Message::user("HUMAN_TEXT", "typed")
    })
    .await;
    for i in 0..2 {
        let t = table.ctx.transcript(i).await.unwrap();
        assert!(t.messages().iter().all(|m| m.speaker != "HUMAN_VOICE"));
    }
    assert!(!table.ctx.is_paused());

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}

#[tokio::test]
async fn quick_double_switch_leaves_one_live_source() {
    let table = Table::new(&["ALICE", "BOB"], InputMode::Text);
    let keyboard = Arc::new(FakeKeyboard::default());
    let (io, tx) = table.human_io(keyboard.clone(), Default::default(), "");
    let modes = ModeSwitch::new(table.ctx.clone(), io, "HUMAN");
    modes.start().await;

    // the first text loop gets stuck delivering behind a held turn lock
    let ledger = table.ctx.turn_lock().await;
    tx.send("first".into()).unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;

    let timeout = table.ctx.timing().mode_join_timeout;
    let started = Instant::now();
    assert!(modes.switch(InputMode::Voice).await);
    assert!(modes.switch(InputMode::Text).await);
    assert!(started.elapsed() < timeout * 2 + Duration::from_millis(100));
    assert_eq!(modes.live_mode().await, Some(InputMode::Text));

    // the voice loop in between is gone
    let frozen = keyboard.polls();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(keyboard.polls(), frozen, "voice loop still polling");

    drop(ledger);
    tx.send("second".into()).unwrap();
    eventually_async("the second line to land", || async {
        table.ctx.transcript(0).await.unwrap().last() == &Message::user("HUMAN_TEXT", "second")
    })
    .await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    // only the live source delivered anything
    let t = table.ctx.transcript(0).await.unwrap();
    let heard: Vec<_> = t.messages()[1..].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(heard, ["second"]);
    assert_eq!(table.raised_gates().len(), 1);

    table.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
    modes.stop().await;
}
