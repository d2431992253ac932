use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn vm8085() -> Command {
    Command::cargo_bin("vm8085").unwrap()
}

#[test]
fn runs_to_halt() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait");

    cmd.assert().success().stdout(contains(
        "PC 0x0803\nSP 0xFFFF\nA 0x05\nB 0x00\nC 0x00\nD 0x00\nE 0x00\nH 0x00\nL 0x00\n\
         CY 0\nP 0\nAC 0\nZ 0\nS 0\nOUT 0x00\nIN 0x00\n",
    ));
}

#[test]
fn inspects_registers_after_halt() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait; info r a; info r pc; info f z; info p psw");

    cmd.assert()
        .success()
        .stderr(contains("A 0x05\n"))
        .stderr(contains("PC 0x0803\n"))
        .stderr(contains("Z 0\n"))
        .stderr(contains("PSW 0x0500\n"));
}

#[test]
fn reports_undefined_opcode_and_continues() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/undefined.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait");

    cmd.assert()
        .success()
        .stderr(contains("Unknown opcode 08 at 0800"))
        .stdout(contains("B 0x01\n"))
        .stdout(contains("PC 0x0804\n"));
}

#[test]
fn calls_and_returns() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/call_ret.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait");

    cmd.assert()
        .success()
        .stdout(contains("A 0x2A\n"))
        .stdout(contains("SP 0xFFFF\n"))
        .stdout(contains("PC 0x0804\n"));
}

#[test]
fn writes_output_port() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/port_out.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait");

    cmd.assert().success().stdout(contains("OUT 0x41\n"));
}

#[test]
fn runs_into_stack_segment() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/fall_through.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait");

    cmd.assert()
        .success()
        .stdout(contains("PC 0xE000\n"))
        .stdout(contains("A 0x00\n"))
        .stdout(contains("B 0x02\n"))
        .stdout(contains("C 0x01\n"))
        .stdout(contains("D 0x04\n"));
}

#[test]
fn halts_looping_program() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/loop.bin")
        .arg("1")
        .arg("--minimal")
        .arg("--command")
        .arg("set b 7; halt; wait; info r b");

    cmd.assert()
        .success()
        .stderr(contains("B 0x07\n"))
        .stdout(contains("B 0x07\n"))
        .stdout(contains("PC 0x0800\n"));
}

#[test]
fn end_of_commands_stops_looping_program() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/loop.bin")
        .arg("1")
        .arg("--minimal")
        .write_stdin("");

    cmd.assert().success().stdout(contains("SP 0xFFFF\n"));
}

#[test]
fn reads_commands_from_stdin() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--minimal")
        .write_stdin("wait\nset a #200\ninfo r a\n");

    cmd.assert()
        .success()
        .stderr(contains("A 0xC8\n"))
        .stdout(contains("A 0xC8\n"));
}

#[test]
fn writes_memory_and_flags() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait; set 2000 0b1010; set cy 1; set ac 1; info a 2000; info f");

    cmd.assert()
        .success()
        .stderr(contains("0x2000 0x0A\n"))
        .stderr(contains("CY 1\nP 0\nAC 1\nZ 0\nS 0\n"))
        .stdout(contains("IN 0x0A\n"));
}

#[test]
fn rejects_malformed_commands() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait; frobnicate; set a 100; info a 10000; set a");

    cmd.assert()
        .success()
        .stderr(contains("Not a command: `frobnicate`"))
        .stderr(contains("Integer too large (at most 0xff)"))
        .stderr(contains("Address 0x10000 is outside of memory"))
        .stderr(contains("Missing argument `value`"))
        .stdout(contains("A 0x05\n"));
}

#[test]
fn shows_and_sets_step_delay() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("#5")
        .arg("--minimal");
    // Delay must be decimal on the command line
    cmd.assert().failure();

    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("5")
        .arg("--minimal")
        .arg("--command")
        .arg("step; step #250; step; wait");

    cmd.assert()
        .success()
        .stderr(contains("Delay between instructions: 5 ms."))
        .stderr(contains("Set delay between instructions to 250 ms."))
        .stderr(contains("Delay between instructions: 250 ms."));
}

#[test]
fn prints_help_message() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--minimal")
        .arg("--command")
        .arg("wait; help; help set");

    cmd.assert()
        .success()
        .stderr(contains(include_str!("../src/debugger/help.txt")))
        .stderr(contains("set <location> <value>"));
}

#[test]
fn traces_instructions() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--trace")
        .arg("--command")
        .arg("wait");

    cmd.assert()
        .success()
        .stderr(contains("0x0800  MVI A,0x05"))
        .stderr(contains("0x0802  HLT"));

    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .env("VM8085_TRACE", "1")
        .arg("--command")
        .arg("wait");

    cmd.assert().success().stderr(contains("0x0802  HLT"));
}

#[test]
fn minimal_hides_trace() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/mvi_hlt.bin")
        .arg("--trace")
        .arg("--minimal")
        .arg("--command")
        .arg("wait");

    cmd.assert()
        .success()
        .stderr(contains("MVI").not());
}

#[test]
fn fails_on_missing_program() {
    let mut cmd = vm8085();
    cmd.arg("tests/files/does_not_exist.bin").arg("--minimal");

    cmd.assert()
        .failure()
        .stderr(contains("Cannot open program"));
}

#[test]
fn fails_on_oversized_program() {
    let path = std::path::Path::new(env!("CARGO_TARGET_TMPDIR")).join("oversized.bin");
    fs::write(&path, vec![0u8; vm8085::IMAGE_LIMIT + 1]).unwrap();

    let mut cmd = vm8085();
    cmd.arg(&path).arg("--minimal");

    cmd.assert()
        .failure()
        .stderr(contains("Program doesn't fit into memory"));
}
