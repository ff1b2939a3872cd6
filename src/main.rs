fn main() -> anyhow::Result<()> {
    let command_line_interface = schemac::cli::CommandLineInterface::load();
    command_line_interface.run()
}
