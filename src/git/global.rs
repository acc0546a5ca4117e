use crate::error::GitResult;
use crate::git::command::GitCommand;
use crate::git::executor::Executor;

/// Set a global git configuration value
///
/// Runs `git config --global <key> "<value>"`. Global configuration is
/// not tied to any repository, so the command runs from the system temp
/// directory.
pub async fn configure(key: &str, value: &str) -> GitResult<()> {
    let executor = Executor::new();
    executor.execute(&config_command(key, value)).await?;
    Ok(())
}

/// Blocking variant of [`configure`]
pub fn configure_blocking(key: &str, value: &str) -> GitResult<()> {
    let executor = Executor::new();
    executor.execute_blocking(&config_command(key, value))?;
    Ok(())
}

fn config_command(key: &str, value: &str) -> GitCommand {
    // The value is quoted so multi-word settings such as "Ada Lovelace"
    // survive postfix splitting as a single argument.
    GitCommand::new(std::env::temp_dir(), "config")
        .flag("--global")
        .flag(key)
        .postfix(format!("\"{}\"", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_command_shape() {
        let command = config_command("user.name", "Ada Lovelace");
        assert_eq!(
            command.argv(),
            vec!["config", "--global", "user.name", "Ada Lovelace"]
        );
        assert_eq!(command.repo_path(), std::env::temp_dir().as_path());
    }

    #[test]
    fn test_config_command_single_word_value() {
        let command = config_command("core.editor", "vim");
        assert_eq!(command.argv(), vec!["config", "--global", "core.editor", "vim"]);
    }

    #[test]
    fn test_config_command_line_keeps_quotes() {
        let command = config_command("user.name", "Ada Lovelace");
        assert_eq!(
            command.command_line(),
            "git config --global user.name \"Ada Lovelace\""
        );
    }
}
