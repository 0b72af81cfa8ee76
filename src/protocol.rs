//! Line-oriented text protocol for driving a game.
//!
//! The framing follows GTP: each command line may start with a numeric id,
//! and every response is `=` (success) or `?` (failure), the echoed id, and
//! a message, followed by a blank line. A front end owns nothing but this
//! stream; the canonical [`GameState`] lives here.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`
//! - `quit`
//! - `clear_board` - Restart from the opening position
//! - `showboard` - Render the board with coordinates
//! - `valid_moves` - Legal placements for the player to move
//! - `play <coord|pass>` - Play a move for the player to move
//! - `genmove` - Let the engine choose and play a move
//! - `analyze` - Search without playing and list root statistics
//! - `score` - Piece counts
//! - `result` - Game status
//! - `iterations <n>` - Set the search budget
//!
//! ## Example
//!
//! ```ignore
//! use reversi_mcts::protocol::TextEngine;
//! let mut engine = TextEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use tracing::{debug, info};

use crate::constants::N;
use crate::mcts::{SearchConfig, SearchEngine};
use crate::position::{GameState, Move, str_coord};

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "analyze",
    "clear_board",
    "genmove",
    "iterations",
    "known_command",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "result",
    "score",
    "showboard",
    "valid_moves",
    "version",
];

/// Text protocol engine state.
pub struct TextEngine {
    /// Canonical game position
    state: GameState,
    /// Settings for each search
    config: SearchConfig,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    /// Create an engine with default search settings.
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            state: GameState::new(),
            config,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Run the command loop over stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary streams until `quit` or EOF.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);

            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());

        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        debug!(command, ?args, "execute");
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "1".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "clear_board" => {
                self.state.restart();
                info!("new game");
                (true, String::new())
            }

            "showboard" => (true, format!("\n{}", render(&self.state))),

            "valid_moves" => {
                let moves: Vec<String> =
                    self.state.valid_moves().into_iter().map(str_coord).collect();
                (true, moves.join(" "))
            }

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let mv: Move = match arg.parse() {
                    Ok(mv) => mv,
                    Err(e) => return (false, e.to_string()),
                };
                let player = self.state.to_move();
                match self.state.apply_move(mv) {
                    Ok(_) => {
                        info!(%player, %mv, "move played");
                        (true, String::new())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                let player = self.state.to_move();
                let mv = self.engine_move();
                if let Err(e) = self.state.apply_move(mv) {
                    return (false, e.to_string());
                }
                info!(%player, %mv, "engine move");
                (true, mv.to_string())
            }

            "analyze" => {
                let mut engine = SearchEngine::with_config(self.state.clone(), self.config.clone());
                let report = engine.run();
                let mut lines = vec![format!(
                    "best {} iterations {} nodes {}",
                    report.best_move.map_or_else(|| "pass".to_string(), str_coord),
                    report.iterations,
                    report.tree.total_nodes
                )];
                for child in engine.root_children() {
                    lines.push(format!(
                        "{} visits {} mean {:.3}",
                        child.mv, child.visits, child.mean_value
                    ));
                }
                (true, lines.join("\n"))
            }

            "score" => {
                let (black, white) = self.state.score();
                (true, format!("black {black} white {white}"))
            }

            "result" => (true, self.state.result().to_string()),

            "iterations" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<usize>() {
                    Ok(n) => {
                        self.config.iterations = n;
                        (true, String::new())
                    }
                    Err(_) => (false, "invalid iteration count".to_string()),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    /// Choose the engine's move: a visible pass when blocked, otherwise the
    /// search result on a copy of the canonical state.
    fn engine_move(&self) -> Move {
        if self.state.is_blocked() {
            return Move::Pass;
        }
        let mut engine = SearchEngine::with_config(self.state.clone(), self.config.clone());
        engine.search().map_or(Move::Pass, Move::Place)
    }
}

/// Render a board with column letters and row numbers.
pub fn render(state: &GameState) -> String {
    let mut out = String::from("  ");
    for x in 0..N {
        out.push((b'a' + x as u8) as char);
        out.push(' ');
    }
    out.push('\n');
    for (y, row) in state.board().to_string().lines().enumerate() {
        out.push_str(&format!("{} {}\n", y + 1, row.trim_end()));
    }
    out.push_str(&format!("{} to move", state.to_move()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;

    fn engine() -> TextEngine {
        TextEngine::with_config(SearchConfig::default().with_iterations(20))
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = TextEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = TextEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut engine = engine();
        let (success, response) = engine.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "reversi-mcts");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();

        let (success, response) = engine.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = engine.execute("known_command", &["boardsize"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_valid_moves() {
        let mut engine = engine();
        let (success, response) = engine.execute("valid_moves", &[]);
        assert!(success);
        assert_eq!(response, "e3 f4 c5 d6");
    }

    #[test]
    fn test_play_and_clear() {
        let mut engine = engine();

        let (success, _) = engine.execute("play", &["f4"]);
        assert!(success);
        assert_eq!(engine.state().score(), (4, 1));
        assert_eq!(engine.state().to_move(), Player::White);

        let (success, response) = engine.execute("play", &["a1"]);
        assert!(!success);
        assert!(response.contains("captures nothing"), "got {response}");

        let (success, _) = engine.execute("play", &["z9"]);
        assert!(!success);

        let (success, _) = engine.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(engine.state(), &GameState::new());
    }

    #[test]
    fn test_genmove_plays_legal_move() {
        let mut engine = engine();
        let before = engine.state().clone();

        let (success, response) = engine.execute("genmove", &[]);
        assert!(success);
        let mv: Move = response.parse().unwrap();
        let Move::Place(pt) = mv else {
            panic!("expected a placement, got {response}");
        };
        assert!(before.is_legal(pt));
        assert_eq!(engine.state().to_move(), Player::White);
    }

    #[test]
    fn test_score_and_result() {
        let mut engine = engine();
        assert_eq!(engine.execute("score", &[]).1, "black 2 white 2");
        assert_eq!(engine.execute("result", &[]).1, "in progress");
    }

    #[test]
    fn test_iterations() {
        let mut engine = engine();
        assert!(engine.execute("iterations", &["5"]).0);
        assert_eq!(engine.config.iterations, 5);
        assert!(!engine.execute("iterations", &["many"]).0);
    }

    #[test]
    fn test_serve_framing() {
        let mut engine = engine();
        let input = b"1 play f4\n# comment\n\n2 play f4\nscore\nquit\nname\n";
        let mut output = Vec::new();
        engine.serve(&input[..], &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let responses: Vec<&str> = text.split("\n\n").filter(|r| !r.is_empty()).collect();
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0], "=1 ");
        assert!(responses[1].starts_with("?2 illegal move"));
        assert_eq!(responses[2], "= black 4 white 1");
        assert_eq!(responses[3], "= ");
    }

    #[test]
    fn test_render() {
        let text = render(&GameState::new());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  a b c d e f g h ");
        assert_eq!(lines[4], "4 . . . X O . . .");
        assert_eq!(lines[9], "black to move");
    }
}
