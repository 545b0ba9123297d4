use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use birthday_cake_core::{
    AcquireError, AcquireErrorKind, AppConfig, AudioStream, CakeError, FrameBuffer, GestureSource,
    InteractionState, InteractionStateMachine, Microphone, RenderSurface, SecurityContext,
    SilentPlayback,
};

const FRAME: Duration = Duration::from_millis(16);

/// Stream that plays back a script of loud/quiet blocks, one per read.
struct ScriptedStream {
    script: Rc<RefCell<VecDeque<bool>>>,
    seed: u32,
}

impl AudioStream for ScriptedStream {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn channels(&self) -> u16 {
        1
    }

    fn read_latest(&mut self, buf: &mut [f32]) -> usize {
        let loud = self.script.borrow_mut().pop_front().unwrap_or(false);
        for value in buf.iter_mut() {
            *value = if loud {
                self.seed ^= self.seed << 13;
                self.seed ^= self.seed >> 17;
                self.seed ^= self.seed << 5;
                (self.seed as f32 / u32::MAX as f32 * 2.0 - 1.0) * 0.8
            } else {
                0.0
            };
        }
        buf.len()
    }

    fn stop(&mut self) {}
}

struct ScriptedMicrophone {
    script: Rc<RefCell<VecDeque<bool>>>,
    deny: bool,
}

impl ScriptedMicrophone {
    fn new() -> Self {
        Self {
            script: Rc::new(RefCell::new(VecDeque::new())),
            deny: false,
        }
    }

    fn push(&self, loud: bool, frames: usize) {
        self.script.borrow_mut().extend(std::iter::repeat(loud).take(frames));
    }
}

impl Microphone for ScriptedMicrophone {
    type Stream = ScriptedStream;

    fn security_context(&self) -> SecurityContext {
        SecurityContext::new(true, "https:")
    }

    async fn request_stream(&mut self) -> Result<ScriptedStream, AcquireError> {
        if self.deny {
            return Err(AcquireError::new(
                AcquireErrorKind::PermissionDenied,
                "user dismissed the prompt",
                self.security_context(),
            ));
        }
        Ok(ScriptedStream {
            script: Rc::clone(&self.script),
            seed: 0x9E37_79B9,
        })
    }
}

fn machine() -> InteractionStateMachine {
    let mut config = AppConfig::default();
    config.celebration.seed = Some(2024);
    InteractionStateMachine::new(&config, Box::new(SilentPlayback)).unwrap()
}

#[test]
fn sustained_exhale_blows_out_the_candles() {
    let mut machine = machine();
    let mut microphone = ScriptedMicrophone::new();
    pollster::block_on(machine.acquire_microphone(&mut microphone)).unwrap();

    let gestures = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&gestures);
    machine
        .detector_mut()
        .subscribe(move |event| seen.borrow_mut().push(event.source));

    machine.add_candle();
    machine.add_candle();

    microphone.push(false, 3);
    microphone.push(true, 40);

    let mut now = Duration::ZERO;
    let mut celebrated_at = None;
    for tick in 0..43 {
        let frame = machine.tick(now);
        if celebrated_at.is_none() && frame.state == InteractionState::Celebrating {
            celebrated_at = Some(tick);
        }
        now += FRAME;
    }

    // three quiet ticks, then the fifth loud one
    assert_eq!(celebrated_at, Some(7));
    assert_eq!(*gestures.borrow(), vec![GestureSource::Microphone]);
    assert_eq!(machine.candles().lit_count(), 0);
}

#[test]
fn acquisition_failure_leaves_the_machine_idle() {
    let mut machine = machine();
    machine.add_candle();
    machine.add_candle();
    assert_eq!(machine.state(), InteractionState::Ready);

    let mut microphone = ScriptedMicrophone::new();
    microphone.deny = true;

    let err = pollster::block_on(machine.acquire_microphone(&mut microphone)).unwrap_err();
    match err {
        CakeError::Acquire(err) => assert_eq!(err.kind, AcquireErrorKind::PermissionDenied),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(machine.state(), InteractionState::Idle);
    assert_eq!(machine.candle_count(), 0);

    assert!(!machine.inject_gesture(Duration::from_secs(1)));
    let frame = machine.tick(Duration::from_secs(1));
    assert_eq!(frame.state, InteractionState::Idle);
    assert!(!frame.effect_active);
}

#[test]
fn add_candle_clamps_at_twenty() {
    let mut machine = machine();
    for _ in 0..25 {
        machine.add_candle();
    }
    assert_eq!(machine.candle_count(), 20);
}

#[test]
fn remove_candle_on_empty_cake_is_harmless() {
    let mut machine = machine();
    assert!(!machine.remove_candle());
    assert_eq!(machine.candle_count(), 0);
    assert_eq!(machine.state(), InteractionState::Idle);
}

#[test]
fn celebration_ends_exactly_after_duration() {
    let mut machine = machine();
    let mut surface = FrameBuffer::new();
    machine.add_candle();

    let start = Duration::from_millis(480);
    machine.inject_gesture(start);

    let mut now = start;
    while now < start + Duration::from_secs(8) {
        let frame = machine.tick(now);
        surface.present(&frame).unwrap();
        assert_eq!(frame.state, InteractionState::Celebrating);
        assert!(frame.effect_active);
        now += FRAME;
    }

    let frame = machine.tick(start + Duration::from_secs(8));
    assert_eq!(frame.state, InteractionState::Ready);
    assert!(frame.particles.is_empty());
    assert!(!frame.effect_active);
    assert!(surface.presented() > 400);
}

#[test]
fn only_one_session_runs_at_a_time() {
    let mut machine = machine();
    machine.add_candle();

    machine.inject_gesture(Duration::ZERO);
    let first = machine.celebration().session().map(|session| session.id);
    machine.inject_gesture(FRAME);

    assert_eq!(machine.celebration().session().map(|session| session.id), first);
    assert_eq!(machine.celebration().particles().len(), 100);
}

#[test]
fn cycles_back_to_ready_and_celebrates_again() {
    let mut machine = machine();
    machine.add_candle();

    machine.inject_gesture(Duration::ZERO);
    machine.tick(Duration::from_secs(8));
    assert_eq!(machine.state(), InteractionState::Ready);

    assert!(machine.inject_gesture(Duration::from_secs(9)));
    assert_eq!(machine.state(), InteractionState::Celebrating);
    assert_eq!(machine.celebration().session().map(|session| session.id), Some(2));
}
