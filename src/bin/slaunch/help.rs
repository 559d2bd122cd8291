pub const COMPLETIONS_HELP: &str = "\
Examples:
  # Bash (add to ~/.bashrc)
  eval \"$(slaunch completions bash)\"

  # Zsh (add to ~/.zshrc)
  eval \"$(slaunch completions zsh)\"

  # Fish
  slaunch completions fish | source";
