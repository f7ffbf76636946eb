use std::io;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::Context;
use chip8vm::display::Screen;
use chip8vm::{Interpreter, Keypad, StepError};
use log::{info, warn};

use crate::cli::ErrorPolicy;

const TARGET_FPS: u32 = 60;

/// Shows the frame buffer. Only called when the interpreter flagged a redraw.
pub trait DisplaySink {
    fn render(&mut self, screen: &Screen) -> io::Result<()>;
}

/// Feeds physical key state into the keypad. Returns true when the user asked to quit.
pub trait InputSource {
    fn poll(&mut self, keypad: &mut Keypad) -> io::Result<bool>;
}

pub trait AudioSink {
    fn beep(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Quit,
}

/// Paces the interpreter: a share of the step rate per 60 Hz frame, then input,
/// then a redraw if one is pending. Over any 60 frames exactly
/// `steps_per_second` steps run.
pub struct Driver<F> {
    interpreter: Interpreter,
    frontend: F,
    steps_per_second: u32,
    frame: u32,
    policy: ErrorPolicy,
}

impl<F: DisplaySink + InputSource + AudioSink> Driver<F> {
    pub fn new(
        interpreter: Interpreter,
        frontend: F,
        steps_per_second: u32,
        policy: ErrorPolicy,
    ) -> Self {
        Driver {
            interpreter,
            frontend,
            steps_per_second,
            frame: 0,
            policy,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs(1) / TARGET_FPS;
        info!(
            "running [steps per second: {}] [on error: {:?}]",
            self.steps_per_second, self.policy
        );

        loop {
            let frame_start = Instant::now();

            if self.run_frame()? == FrameStatus::Quit {
                info!("quit requested");
                return Ok(());
            }

            if let Some(sleep_time) = frame_duration.checked_sub(frame_start.elapsed()) {
                sleep(sleep_time);
            }
        }
    }

    /// Runs one frame's worth of steps, then polls input and redraws.
    pub fn run_frame(&mut self) -> anyhow::Result<FrameStatus> {
        for _ in 0..self.next_frame_steps() {
            match self.interpreter.step() {
                Ok(outcome) => {
                    if outcome.tone {
                        self.frontend.beep().context("audio output failed")?;
                    }
                }
                Err(err) => self.handle_step_error(err)?,
            }
        }

        let quit = self
            .frontend
            .poll(self.interpreter.keypad_mut())
            .context("reading input failed")?;

        if self.interpreter.take_redraw() {
            self.frontend
                .render(self.interpreter.display().screen())
                .context("drawing the screen failed")?;
        }

        Ok(if quit {
            FrameStatus::Quit
        } else {
            FrameStatus::Continue
        })
    }

    /// Spreads the remainder of `steps_per_second / TARGET_FPS` over the second.
    fn next_frame_steps(&mut self) -> u64 {
        let rate = u64::from(self.steps_per_second);
        let frame = u64::from(self.frame);
        self.frame = (self.frame + 1) % TARGET_FPS;
        rate * (frame + 1) / u64::from(TARGET_FPS) - rate * frame / u64::from(TARGET_FPS)
    }

    fn handle_step_error(&mut self, err: StepError) -> Result<(), StepError> {
        match self.policy {
            ErrorPolicy::Halt => Err(err),
            ErrorPolicy::Skip => {
                warn!("{err}, skipping");
                self.interpreter.skip_instruction();
                Ok(())
            }
        }
    }
}
