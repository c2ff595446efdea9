use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;

/// Print a completion script for `shell`, named after the binary.
#[allow(clippy::unnecessary_wraps)]
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    let mut cmd = C::command();
    let bin = cmd.get_name().to_owned();
    clap_complete::generate(shell, &mut cmd, bin, &mut std::io::stdout().lock());
    Ok(EXIT_SUCCESS)
}
