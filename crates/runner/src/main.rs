//! Headless ARM710 runner: load a ROM image into bank 0 and execute it
//! for a fixed instruction budget, or until it halts, then dump register
//! state. No windowing, audio, or keyboard input (§1 Non-goals); the I/O
//! and framebuffer collaborators are the no-op stand-ins.

use std::process::ExitCode;

use cpu_arm710::CpuVariant;
use machine_arm710::{Emulate, Machine, NoFramebuffer, NoIo, Rom};

struct Args {
    rom_path: String,
    variant: CpuVariant,
    step_limit: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut rom_path = None;
    let mut variant = CpuVariant::ArmV3;
    let mut step_limit = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--variant" => {
                let value = args.next().ok_or("--variant needs an argument")?;
                variant = match value.as_str() {
                    "v3" => CpuVariant::ArmV3,
                    "v4" => CpuVariant::ArmV4,
                    other => return Err(format!("unknown variant '{other}' (expected v3 or v4)")),
                };
            }
            "--steps" => {
                let value = args.next().ok_or("--steps needs an argument")?;
                step_limit = Some(
                    value
                        .parse()
                        .map_err(|_| format!("'{value}' is not a valid step count"))?,
                );
            }
            _ if rom_path.is_none() => rom_path = Some(arg),
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    Ok(Args {
        rom_path: rom_path.ok_or("usage: arm710-runner <rom-path> [--variant v3|v4] [--steps N]")?,
        variant,
        step_limit,
    })
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("arm710-runner: {message}");
            return ExitCode::FAILURE;
        }
    };

    let rom = Rom::load(&args.rom_path);
    let mut machine = Machine::new(args.variant, rom, NoIo, NoFramebuffer);

    let mut steps_run: u64 = 0;
    loop {
        if machine.cpu.is_halted() {
            break;
        }
        if let Some(limit) = args.step_limit {
            if steps_run >= limit {
                break;
            }
        }
        machine.emulate = Emulate::Once;
        machine.run();
        steps_run += 1;
    }

    dump_state(&machine);
    ExitCode::SUCCESS
}

fn dump_state<Io, Fb>(machine: &Machine<Io, Fb>) {
    let cpu = &machine.cpu;
    println!("pc:   {:#010x}", cpu.pc());
    println!("cpsr: {:#010x} ({:?})", cpu.cpsr().bits(), cpu.cpsr().mode());
    for i in 0..15 {
        println!("r{i:<2}: {:#010x}", cpu.register(i));
    }
    println!("retired: {}", cpu.retired());
    println!(
        "cycles: seq={} nseq={} internal={} coproc={}",
        machine.counters.sequential,
        machine.counters.non_sequential,
        machine.counters.internal,
        machine.counters.coprocessor
    );
}
