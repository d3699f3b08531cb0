//! UberClock datapath: NCO and downconversion phase increments, muxes,
//! gains and the capture controls.

use core::fmt::Write;

use super::{next_arg, required};
use crate::console::{puts_help_header, Command, Table};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::parse::{parse_below, parse_i32, parse_u32};
use crate::soc::main as uc;

/// Phase increments are 19-bit.
pub const PHASE_LIMIT: u32 = 1 << 19;

pub static TABLE: Table<Context> = Table {
    title: "UberClock commands",
    commands: &[
        Command { name: "help_uc", handler: help_uc, help: "UberClock help" },
        Command { name: "phase_nco", handler: phase_nco, help: "Set input CORDIC NCO phase increment" },
        Command { name: "phase_cpu", handler: phase_cpu, help: "Set CPU CORDIC phase increment" },
        Command { name: "phase_down_1", handler: phase_down_1, help: "Set downconversion ch1 phase inc" },
        Command { name: "phase_down_2", handler: phase_down_2, help: "Set downconversion ch2 phase inc" },
        Command { name: "phase_down_3", handler: phase_down_3, help: "Set downconversion ch3 phase inc" },
        Command { name: "phase_down_4", handler: phase_down_4, help: "Set downconversion ch4 phase inc" },
        Command { name: "phase_down_5", handler: phase_down_5, help: "Set downconversion ch5 phase inc" },
        Command { name: "output_select_ch1", handler: output_select_ch1, help: "Select DAC1 source (0..3)" },
        Command { name: "output_select_ch2", handler: output_select_ch2, help: "Select DAC2 source (0..3)" },
        Command { name: "input_select", handler: input_select, help: "Set input select register" },
        Command { name: "upsampler_input_mux", handler: upsampler_input_mux, help: "Set upsampler input mux" },
        Command { name: "gain1", handler: gain1, help: "Set gain1" },
        Command { name: "gain2", handler: gain2, help: "Set gain2" },
        Command { name: "gain3", handler: gain3, help: "Set gain3" },
        Command { name: "gain4", handler: gain4, help: "Set gain4" },
        Command { name: "gain5", handler: gain5, help: "Set gain5" },
        Command { name: "final_shift", handler: final_shift, help: "Set final shift" },
        Command { name: "cap_enable", handler: cap_enable, help: "0=ramp, 1=capture design to DDR" },
        Command { name: "cap_beats", handler: cap_beats, help: "Set capture length in 256-bit beats" },
        Command { name: "phase", handler: phase, help: "Print current CORDIC phase" },
        Command { name: "magnitude", handler: magnitude, help: "Print current CORDIC magnitude" },
    ],
};

fn help_uc(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "UberClock commands");
    for line in [
        "  phase_nco    <val>      (0..524287)",
        "  phase_cpu    <val>      (0..524287)",
        "  phase_down_1 <val> ... phase_down_5 <val>  (0..524287)",
        "  input_select <val>              (0=ADC, 1=NCO, 2=CPU, 3=TEST RAMP)",
        "  upsampler_input_mux <val>       (0=Gain,1=CPU,2=CPU NCO)",
        "  output_select_ch1 <0..3>",
        "  output_select_ch2 <0..3>",
        "  gain1|gain2|gain3|gain4|gain5 <int32>",
        "  final_shift  <int32>",
        "  cap_enable   <0|1>      (0=ramp->DDR, 1=capture design->DDR)",
        "  cap_beats    <N>        (# of 256-bit beats captured by the gateware)",
        "  phase",
        "  magnitude",
        "",
    ] {
        writeln!(ctx, "{}", line).ok();
    }
    Ok(())
}

/// Writes `value` to a datapath register and commits it.
fn poke(ctx: &mut Context, addr: usize, value: u32) {
    ctx.bus.write32(addr, value);
    ctx.commit();
}

fn phase_arg(args: &str, what: &'static str) -> Result<u32> {
    let mut args = args;
    parse_below(next_arg(&mut args), PHASE_LIMIT, what)
}

fn phase_nco(ctx: &mut Context, args: &str) -> Result<()> {
    let p = phase_arg(args, "phase_nco")?;
    poke(ctx, uc::PHASE_INC_NCO, p);
    writeln!(ctx, "Input NCO phase increment set to {}", p).ok();
    Ok(())
}

fn phase_cpu(ctx: &mut Context, args: &str) -> Result<()> {
    let p = phase_arg(args, "phase_cpu")?;
    poke(ctx, uc::PHASE_INC_CPU, p);
    writeln!(ctx, "CPU phase increment set to {}", p).ok();
    Ok(())
}

/// `ch` is 1-based.
fn phase_down(ctx: &mut Context, args: &str, ch: usize) -> Result<()> {
    let p = phase_arg(args, "phase_down")?;
    poke(ctx, uc::PHASE_INC_DOWN[ch - 1], p);
    writeln!(ctx, "Downconversion phase ch{} increment set to {}", ch, p).ok();
    Ok(())
}

fn phase_down_1(ctx: &mut Context, args: &str) -> Result<()> {
    phase_down(ctx, args, 1)
}

fn phase_down_2(ctx: &mut Context, args: &str) -> Result<()> {
    phase_down(ctx, args, 2)
}

fn phase_down_3(ctx: &mut Context, args: &str) -> Result<()> {
    phase_down(ctx, args, 3)
}

fn phase_down_4(ctx: &mut Context, args: &str) -> Result<()> {
    phase_down(ctx, args, 4)
}

fn phase_down_5(ctx: &mut Context, args: &str) -> Result<()> {
    phase_down(ctx, args, 5)
}

fn output_select(ctx: &mut Context, mut args: &str, addr: usize, name: &str) -> Result<()> {
    let v = parse_u32(required(&mut args, "source")?)? & 0x3;
    poke(ctx, addr, v);
    writeln!(ctx, "{} set to {}", name, v).ok();
    Ok(())
}

fn output_select_ch1(ctx: &mut Context, args: &str) -> Result<()> {
    output_select(ctx, args, uc::OUTPUT_SELECT_CH1, "output_select_ch1")
}

fn output_select_ch2(ctx: &mut Context, args: &str) -> Result<()> {
    output_select(ctx, args, uc::OUTPUT_SELECT_CH2, "output_select_ch2")
}

fn input_select(ctx: &mut Context, mut args: &str) -> Result<()> {
    let v = parse_u32(required(&mut args, "select")?)?;
    poke(ctx, uc::INPUT_SELECT, v);
    writeln!(ctx, "Main input select register set to {}", v).ok();
    Ok(())
}

fn upsampler_input_mux(ctx: &mut Context, mut args: &str) -> Result<()> {
    let v = parse_u32(required(&mut args, "mux")?)?;
    poke(ctx, uc::UPSAMPLER_INPUT_MUX, v);
    writeln!(ctx, "Upsampler input mux register set to {}", v).ok();
    Ok(())
}

fn gain(ctx: &mut Context, mut args: &str, idx: usize) -> Result<()> {
    let g = parse_i32(required(&mut args, "gain")?)?;
    poke(ctx, uc::GAIN[idx - 1], g as u32);
    writeln!(ctx, "Gain{} register set to {} (0x{:08X})", idx, g, g as u32).ok();
    Ok(())
}

fn gain1(ctx: &mut Context, args: &str) -> Result<()> {
    gain(ctx, args, 1)
}

fn gain2(ctx: &mut Context, args: &str) -> Result<()> {
    gain(ctx, args, 2)
}

fn gain3(ctx: &mut Context, args: &str) -> Result<()> {
    gain(ctx, args, 3)
}

fn gain4(ctx: &mut Context, args: &str) -> Result<()> {
    gain(ctx, args, 4)
}

fn gain5(ctx: &mut Context, args: &str) -> Result<()> {
    gain(ctx, args, 5)
}

fn final_shift(ctx: &mut Context, mut args: &str) -> Result<()> {
    let fs = parse_i32(required(&mut args, "shift")?)?;
    poke(ctx, uc::FINAL_SHIFT, fs as u32);
    writeln!(ctx, "final_shift set to {} (0x{:08X})", fs, fs as u32).ok();
    Ok(())
}

pub(crate) fn mode_name(v: u32) -> &'static str {
    if v != 0 {
        "CAPTURE(design)->DDR"
    } else {
        "RAMP->DDR"
    }
}

/// Any non-zero value selects capture mode.
pub(crate) fn set_cap_enable(ctx: &mut Context, mut args: &str) -> Result<()> {
    let v = (parse_u32(required(&mut args, "0|1")?)? != 0) as u32;
    poke(ctx, uc::CAP_ENABLE, v);
    writeln!(ctx, "cap_enable = {} ({})", v, mode_name(v)).ok();
    Ok(())
}

fn cap_enable(ctx: &mut Context, args: &str) -> Result<()> {
    set_cap_enable(ctx, args)
}

fn cap_beats(ctx: &mut Context, mut args: &str) -> Result<()> {
    let v = match next_arg(&mut args) {
        "" => 256,
        token => parse_u32(token)?,
    };
    if v == 0 {
        return Err(Error::Zero("cap_beats"));
    }
    poke(ctx, uc::CAP_BEATS, v);
    writeln!(ctx, "cap_beats = {}", v).ok();
    Ok(())
}

fn phase(ctx: &mut Context, _args: &str) -> Result<()> {
    let phase = ctx.cordic.phase;
    writeln!(ctx, "Phase {}", phase).ok();
    Ok(())
}

fn magnitude(ctx: &mut Context, _args: &str) -> Result<()> {
    let magnitude = ctx.cordic.magnitude;
    writeln!(ctx, "Magnitude {}", magnitude).ok();
    Ok(())
}
