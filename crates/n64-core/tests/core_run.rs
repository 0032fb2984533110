//! Emulation core run paths: video failure, loop faults and panics

mod common;

use common::{random_bytes, write_rom, CountingExecutor, Failure, Counters, RecordingBackend};
use n64_core::{
    create_event_channel, CorePhase, EmulationCore, Event, EventReceiver, VideoError,
};
use std::thread;
use std::time::Duration;

fn loaded_core(
    backend: RecordingBackend,
    counters: &Counters,
    failure: Failure,
) -> (EmulationCore, EventReceiver) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_rom(&dir, "core.z64", &random_bytes(256, 42));
    let (sender, receiver) = create_event_channel();
    let mut core = EmulationCore::new(
        sender,
        Box::new(backend),
        Box::new(CountingExecutor::with_failure(counters, failure)),
    );
    core.load_rom(&path).unwrap();
    assert_eq!(
        receiver.drain_all(),
        vec![Event::Log("Loaded ROM: core.z64".to_string())]
    );
    (core, receiver)
}

#[test]
fn test_video_error_skips_loop_and_releases_nothing() {
    let counters = Counters::default();
    let backend =
        RecordingBackend::failing(&counters, VideoError::Window("bad mode 640x480".to_string()));
    let (mut core, receiver) = loaded_core(backend, &counters, Failure::None);

    core.run();

    assert_eq!(core.phase(), CorePhase::Shutdown);
    assert_eq!(counters.frames(), 0);
    assert_eq!(counters.releases(), 0);
    assert_eq!(
        receiver.drain_all(),
        vec![Event::Error("Window creation failed: bad mode 640x480".to_string())]
    );
    assert!(!core.run_flag().is_set());
}

#[test]
fn test_loop_fault_reports_once_and_shuts_down() {
    let counters = Counters::default();
    let (mut core, receiver) =
        loaded_core(RecordingBackend::new(&counters), &counters, Failure::ErrorAt(3));

    core.run();

    let events = receiver.drain_all();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        Event::Error("frame execution failed: illegal opcode in frame 3".to_string())
    );
    assert_eq!(counters.frames(), 3);
    assert_eq!(core.frame_count(), 2);
    assert_eq!(counters.opens(), 1);
    assert_eq!(counters.releases(), 1);
    assert_eq!(core.phase(), CorePhase::Shutdown);
}

#[test]
fn test_panic_in_loop_is_contained() {
    let counters = Counters::default();
    let (mut core, receiver) =
        loaded_core(RecordingBackend::new(&counters), &counters, Failure::PanicAt(2));

    core.run();

    let events = receiver.drain_all();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_error());
    assert!(
        events[0].message().contains("executor exploded in frame 2"),
        "{}",
        events[0].message()
    );
    assert_eq!(counters.releases(), 1);
    assert_eq!(core.phase(), CorePhase::Shutdown);
}

#[test]
fn test_panic_during_bring_up_is_contained() {
    let counters = Counters::default();
    let (core, receiver) =
        loaded_core(RecordingBackend::panicking(&counters), &counters, Failure::None);

    // The thread still hands the core back
    let core = core.spawn().unwrap().join().unwrap();

    assert_eq!(core.phase(), CorePhase::Shutdown);
    assert!(core.has_rom());
    assert!(!core.run_flag().is_set());
    assert_eq!(counters.opens(), 0);
    assert_eq!(counters.frames(), 0);

    let events = receiver.drain_all();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        Event::Error("emulation thread panicked: video driver exploded".to_string())
    );
}

#[test]
fn test_spawned_core_stops_on_flag_and_comes_back() {
    let counters = Counters::default();
    let (core, receiver) = loaded_core(RecordingBackend::new(&counters), &counters, Failure::None);
    let flag = core.run_flag();

    let handle = core.spawn().unwrap();
    assert!(flag.is_set());

    while counters.frames() < 2 {
        thread::sleep(Duration::from_millis(1));
    }
    flag.request_stop();

    let core = handle.join().unwrap();
    assert_eq!(core.phase(), CorePhase::Shutdown);
    assert!(core.frame_count() >= 2);
    assert_eq!(counters.releases(), 1);
    assert!(receiver.drain_all().is_empty());
}

#[test]
fn test_stop_before_thread_starts_is_honored() {
    let counters = Counters::default();
    let (core, _receiver) = loaded_core(RecordingBackend::new(&counters), &counters, Failure::None);
    let flag = core.run_flag();

    let handle = core.spawn().unwrap();
    flag.request_stop();

    // Terminates even if the stop landed before the thread ran
    let core = handle.join().unwrap();
    assert_eq!(core.phase(), CorePhase::Shutdown);
    assert!(!core.run_flag().is_set());
    assert_eq!(counters.releases(), counters.opens());
}

#[test]
fn test_loaded_bytes_match_file() {
    let dir = tempfile::tempdir().unwrap();
    let counters = Counters::default();
    let (sender, receiver) = create_event_channel();
    let mut core = EmulationCore::new(
        sender,
        Box::new(RecordingBackend::new(&counters)),
        Box::new(CountingExecutor::new(&counters)),
    );

    for (i, len) in [1usize, 3, 4096, 65_537].into_iter().enumerate() {
        let bytes = random_bytes(len, 0x9e37_79b9 ^ i as u32);
        let name = format!("rom{i}.n64");
        let path = write_rom(&dir, &name, &bytes);

        core.load_rom(&path).unwrap();

        assert_eq!(core.rom().unwrap().bytes(), &bytes[..]);
        assert_eq!(
            receiver.drain_all(),
            vec![Event::Log(format!("Loaded ROM: {name}"))]
        );
    }
}
