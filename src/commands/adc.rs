//! Mixed-signal commands: DAC waveform table and one-shot ADC snapshots.

use core::fmt::Write;

use super::next_arg;
use crate::console::{Command, Table};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::parse::parse_below;
use crate::soc::miniac;

const MIDSCALE: f32 = 8192.0;
const DEFAULT_AMPLITUDE: u32 = 2000;
/// Table periods of the two tones, channel 0 first.
const TONES: [u32; 2] = [3, 11];

pub static TABLE: Table<Context> = Table {
    title: "ADC/DAC commands",
    commands: &[
        Command { name: "dacwave", handler: dacwave, help: "Load and play the two-tone DAC table [amplitude]" },
        Command { name: "dacwave_off", handler: dacwave_off, help: "Stop DAC table playback" },
        Command { name: "adc_snap", handler: adc_snap, help: "Trigger one ADC snapshot and dump it [words]" },
    ],
};

fn tone_sample(amplitude: f32, periods: u32, i: usize) -> u16 {
    let phase = 2.0
        * core::f32::consts::PI
        * (periods as f32 / miniac::DAC_SAMPLES as f32)
        * i as f32;
    (amplitude * libm::sinf(phase) + MIDSCALE) as u16
}

/// One full cycle of the table: both tones complete a whole number of
/// periods over `DAC_SAMPLES` words, so playback loops without a seam.
pub fn tone_table(amplitude: u32) -> [u32; miniac::DAC_SAMPLES] {
    let amplitude = amplitude as f32;
    let mut table = [0u32; miniac::DAC_SAMPLES];
    for (i, word) in table.iter_mut().enumerate() {
        let ch0 = tone_sample(amplitude, TONES[0], i);
        let ch1 = tone_sample(amplitude, TONES[1], i);
        *word = (ch1 as u32) << 16 | ch0 as u32;
    }
    table
}

fn dacwave(ctx: &mut Context, mut args: &str) -> Result<()> {
    let amplitude = match next_arg(&mut args) {
        "" => DEFAULT_AMPLITUDE,
        token => parse_below(token, MIDSCALE as u32, "amplitude")?,
    };
    let clock_hz = ctx.config.clock_hz as u64;
    writeln!(
        ctx,
        "DAC: Generating synchronized table for {} MHz clock...",
        clock_hz / 1_000_000
    )
    .ok();

    let bus = ctx.bus;
    bus.write32(miniac::DAC_MEM_EN, 0);
    for (i, word) in tone_table(amplitude).iter().enumerate() {
        bus.write32(miniac::DAC_TABLE + 4 * i, *word);
    }
    bus.barrier();
    bus.write32(miniac::DAC_MEM_LEN, miniac::DAC_SAMPLES as u32);
    bus.write32(miniac::DAC_MEM_EN, 1);

    let tone_hz = |periods: u32| periods as u64 * clock_hz / miniac::DAC_SAMPLES as u64;
    writeln!(
        ctx,
        "DAC: {} Hz and {} Hz signals active (N={}).",
        tone_hz(TONES[0]),
        tone_hz(TONES[1]),
        miniac::DAC_SAMPLES
    )
    .ok();
    Ok(())
}

fn dacwave_off(ctx: &mut Context, _args: &str) -> Result<()> {
    ctx.bus.write32(miniac::DAC_MEM_EN, 0);
    writeln!(ctx, "DAC: table playback stopped.").ok();
    Ok(())
}

fn adc_snap(ctx: &mut Context, mut args: &str) -> Result<()> {
    let words = match next_arg(&mut args) {
        "" => miniac::ADC_WORDS as u32,
        token => parse_below(token, miniac::ADC_WORDS as u32 + 1, "words")?,
    };
    if words == 0 {
        return Err(Error::Zero("words"));
    }

    let bus = ctx.bus;
    writeln!(ctx, "ADC: Triggering...").ok();
    bus.write32(miniac::ADC_START, 1);
    ctx.busy_wait(1);
    bus.write32(miniac::ADC_START, 0);

    writeln!(ctx, "ADC: Acquisition in progress...").ok();
    while bus.read32(miniac::ADC_DONE) == 0 {}

    writeln!(ctx, "=== BRAM_TRANSFER_START ===").ok();
    for i in 0..words as usize {
        let data = bus.read32(miniac::ADC_BUFFER + 4 * i);
        writeln!(ctx, "{:08X}", data).ok();
    }
    writeln!(ctx, "=== BRAM_TRANSFER_END ===").ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::commands::testing::Shell;
    use crate::config::Capabilities;

    #[test]
    fn tone_table_packs_both_channels() {
        let table = tone_table(2000);
        assert_eq!(table[0], 0x2000_2000);
        assert_eq!(table[13], 0x276E_1B68);
        assert!(tone_table(0).iter().all(|w| *w == 0x2000_2000));
        let top = tone_table(8191);
        assert!(top.iter().all(|w| (w & 0xFFFF) < 0x4000 && (w >> 16) < 0x4000));
    }

    #[test]
    fn dacwave_loads_table_then_enables() {
        let mut shell = Shell::new(Capabilities::all());
        let out = shell.run("dacwave");
        assert_eq!(
            out,
            "DAC: Generating synchronized table for 65 MHz clock...\n\
             DAC: 3000000 Hz and 11000000 Hz signals active (N=65).\n"
        );
        let writes = shell.reg_writes();
        assert_eq!(writes.first(), Some(&(miniac::DAC_MEM_EN, 0)));
        assert_eq!(
            &writes[writes.len() - 2..],
            [(miniac::DAC_MEM_LEN, 65), (miniac::DAC_MEM_EN, 1)]
        );
        assert_eq!(shell.bus.read32(miniac::DAC_TABLE + 4 * 13), 0x276E_1B68);
        assert_eq!(shell.bus.read32(miniac::DAC_TABLE + 4 * 64), tone_table(2000)[64]);
    }

    #[test]
    fn dacwave_amplitude_is_range_checked() {
        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(
            shell.run("dacwave 8192"),
            "Error: amplitude must be 0..8191\n"
        );
        assert!(shell.reg_writes().is_empty());
        shell.run("dacwave 0");
        assert_eq!(shell.bus.read32(miniac::DAC_TABLE + 4 * 7), 0x2000_2000);
        assert_eq!(shell.run("dacwave_off"), "DAC: table playback stopped.\n");
        assert_eq!(shell.reg_writes(), [(miniac::DAC_MEM_EN, 0)]);
    }

    #[test]
    fn snapshot_pulses_start_and_dumps_buffer() {
        let mut shell = Shell::new(Capabilities::all());
        shell.bus.preset32(miniac::ADC_DONE, 1);
        shell.bus.preset32(miniac::ADC_BUFFER, 0x0123_ABCD);
        shell.bus.preset32(miniac::ADC_BUFFER + 4, 0xFFFF_0001);
        let out = shell.run("adc_snap 3");
        assert_eq!(
            out,
            "ADC: Triggering...\n\
             ADC: Acquisition in progress...\n\
             === BRAM_TRANSFER_START ===\n\
             0123ABCD\nFFFF0001\n00000000\n\
             === BRAM_TRANSFER_END ===\n"
        );
        assert_eq!(shell.bus.writes_to(miniac::ADC_START), [1, 0]);

        let out = shell.run("adc_snap");
        assert_eq!(out.lines().count(), 4 + miniac::ADC_WORDS);
    }

    #[test]
    fn snapshot_word_count_is_checked_before_triggering() {
        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(shell.run("adc_snap 0"), "Error: words must be >= 1\n");
        assert_eq!(shell.run("adc_snap 4097"), "Error: words must be 0..4096\n");
        assert!(shell.bus.writes_to(miniac::ADC_START).is_empty());
    }
}
