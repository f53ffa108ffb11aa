use color_eyre::eyre::{Result, eyre};

use crate::load::intensity::IntensitySettings;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    /// Raw value; the generator clamps and caps it.
    SetCpu(i64),
    SetRam(i64),
    SetBoth(IntensitySettings),
    Status,
    History,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  start             begin generating load
  stop              release all load
  cpu <0-100>       set CPU intensity
  ram <0-100>       set RAM intensity
  set <cpu> <ram>   set both intensities
  status            show generator state
  history           show recent usage
  help              show this text
  quit              stop and exit";

/// Parses one line of user input. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let command = match head.to_lowercase().as_str() {
        "start" | "on" => Command::Start,
        "stop" | "off" => Command::Stop,
        "cpu" => Command::SetCpu(parse_value(words.next(), "cpu")?),
        "ram" | "mem" => Command::SetRam(parse_value(words.next(), "ram")?),
        "set" => {
            let cpu = parse_value(words.next(), "set")?;
            let ram = parse_value(words.next(), "set")?;
            Command::SetBoth(IntensitySettings::new(cpu, ram))
        }
        "status" | "s" => Command::Status,
        "history" | "h" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(eyre!("unknown command `{other}` (try `help`)")),
    };
    if let Some(extra) = words.next() {
        return Err(eyre!("unexpected argument `{extra}` for `{head}`"));
    }
    Ok(Some(command))
}

fn parse_value(word: Option<&str>, command: &str) -> Result<i64> {
    let word = word.ok_or_else(|| eyre!("`{command}` needs a percentage"))?;
    word.trim_end_matches('%')
        .parse()
        .map_err(|_| eyre!("`{word}` is not a number"))
}
