pub fn bin_command(name: &str) -> anyhow::Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin(name)?;
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}
