//! Script loaded at startup and on every reload

use livetime::{Count, Engine, SchedulerError};

pub fn script(e: &mut Engine) -> Result<(), SchedulerError> {
    e.log("hello from livetime");
    e.note(36, 127, 1.0, None)?;

    e.wait(2.0);
    e.flog(format!("waited for 2, cursor at {:.2}", e.cursor()))?;
    e.note(40, 127, 1.0, None)?;

    e.at(e.now() + 1.0);
    e.flog("one second after the script ran")?;

    // Everything below starts on the next bar of 4 seconds
    e.next(4.0);
    e.repeat(
        0.25,
        |e: &mut Engine, i: u64| e.log(format!("repeat #{i}")),
        Count::Times(5),
    );

    e.channel(9);
    e.live_loop("drums", |e: &mut Engine| -> Result<(), SchedulerError> {
        e.note(36, 120, 0.1, None)?;
        e.wait(0.5);
        e.note(38, 90, 0.1, None)?;
        e.wait(0.5);
        Ok(())
    });

    e.channel(0);
    e.live_loop("bass", |e: &mut Engine| -> Result<(), SchedulerError> {
        for pitch in [36, 36, 43, 41] {
            e.note(pitch, 100, 0.2, Some(1))?;
            e.wait(0.25);
        }
        Ok(())
    });

    e.live_loop("pad", |e: &mut Engine| -> Result<(), SchedulerError> {
        e.cc(74, 40, Some(2))?;
        e.scoped(|e| {
            e.channel(2);
            for pitch in [60, 63, 67] {
                e.note(pitch, 70, 1.8, None)?;
            }
            Ok::<_, SchedulerError>(())
        })?;
        e.wait(2.0);
        Ok(())
    });

    Ok(())
}
