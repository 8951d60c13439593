mod options;

use std::process::exit;
use std::time::Duration;

use itertools::Itertools;
pub use options::HtpServerOptions;

use crate::hex::prelude::*;
use crate::solver::{Solver, SolverParam};

/// Line-oriented engine protocol over stdin/stdout.
///
/// The server owns the authoritative game record as a plain stone
/// board; analysis state is built lazily per query so that a failed
/// command never leaves a half-updated engine behind.
pub struct HtpServer {
    config: HtpServerOptions,
    ice: &'static IceEngine,
    swap: SwapMoves,
    solver: Solver,
    geom: &'static Geometry,
    stones: StoneBoard<'static>,
    moves: Vec<(Color, HexPoint)>,
    analysis: Option<(HexBoard<'static>, Color)>,
}

impl HtpServer {
    pub fn new(options: HtpServerOptions, ice: &'static IceEngine) -> Result<HtpServer> {
        let swap = match &options.swap_file {
            Some(path) => SwapMoves::load(path).unwrap_or_else(|e| {
                log::warn!("swap moves disabled: {e}");
                SwapMoves::empty()
            }),
            None => SwapMoves::empty(),
        };

        let height = options.height.unwrap_or(options.boardsize);
        let geom: &'static Geometry = Box::leak(Box::new(Geometry::new(options.boardsize, height)?));
        let mut stones = StoneBoard::new(geom);
        stones.start_new_game();

        let mut solver = Solver::new(SolverParam {
            tt_bits: options.tt_bits,
            time_limit: options.time_limit.map(Duration::from_secs),
            ..SolverParam::default()
        });
        if let Some(path) = &options.db_file {
            match crate::solver::SolverDb::open(path, geom.width(), geom.height(), options.db_max_stones)
            {
                Ok(db) => solver.set_db(Some(db)),
                Err(e) => log::warn!("solver db disabled: {e}"),
            }
        }

        Ok(HtpServer {
            config: options,
            ice,
            swap,
            solver,
            geom,
            stones,
            moves: vec![],
            analysis: None,
        })
    }

    /// Serves until `quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut cmdstr = String::new();
            if std::io::stdin().read_line(&mut cmdstr)? == 0 {
                return Ok(());
            }

            let args: Vec<&str> = cmdstr.split_whitespace().collect();
            match args.split_first() {
                Some((cmd, rest)) => self.apply(cmd, rest)?,
                None => self.apply("", &[])?,
            }
        }
    }

    /// Runs a command; recoverable failures report on the stream.
    fn apply(&mut self, cmd: &str, args: &[&str]) -> Result<()> {
        let result = match cmd {
            "" => Ok(()),
            "name" => self.name(),
            "version" => self.version(),
            "boardsize" => self.boardsize(args),
            "clear_board" => self.clear_board(),
            "play" => self.play(args),
            "undo" => self.undo(),
            "showboard" => self.showboard(),
            "vc-between" => self.vc_between(args),
            "mustplay" => self.mustplay(args),
            "fillin" => self.fillin(args),
            "solve" => self.solve(args),
            "swap-check" => self.swap_check(args),
            "quit" => exit(0),
            _ => Err(anyhow!("unrecognized command {cmd}")),
        };

        match result {
            Ok(_) => {
                log::debug!("command completed: {cmd} {}", args.join(" "));
                self.ok()
            }
            Err(err) => {
                log::warn!("encountered recoverable error:\n{err}");
                self.err(&err)
            }
        }
    }

    // commands

    fn name(&self) -> Result<()> {
        println!("{}", env!("CARGO_PKG_NAME"));
        Ok(())
    }

    fn version(&self) -> Result<()> {
        println!("{}", env!("CARGO_PKG_VERSION"));
        Ok(())
    }

    fn boardsize(&mut self, args: &[&str]) -> Result<()> {
        let width: usize = args
            .first()
            .ok_or_else(|| anyhow!("no size provided"))?
            .parse()?;
        let height: usize = match args.get(1) {
            Some(h) => h.parse()?,
            None => width,
        };
        self.geom = Box::leak(Box::new(Geometry::new(width, height)?));
        self.clear_board()
    }

    fn clear_board(&mut self) -> Result<()> {
        self.stones = StoneBoard::new(self.geom);
        self.stones.start_new_game();
        self.moves.clear();
        self.analysis = None;
        Ok(())
    }

    fn play(&mut self, args: &[&str]) -> Result<()> {
        let color = Color::parse(args.first().ok_or_else(|| anyhow!("no colour provided"))?)?
            .ok_or_else(|| anyhow!("cannot play empty"))?;
        let cell: HexPoint = args
            .get(1)
            .ok_or_else(|| anyhow!("no cell provided"))?
            .parse()?;
        if !cell.is_interior() || !self.geom.is_cell(cell) {
            return Err(anyhow!("{cell} is not a cell on this board"));
        }
        if !self.stones.is_legal(cell) {
            return Err(anyhow!("{cell} is not a legal move"));
        }

        self.stones.play_move(color, cell);
        self.moves.push((color, cell));
        self.analysis = None;
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let (_, cell) = self
            .moves
            .pop()
            .ok_or_else(|| anyhow!("no move to undo"))?;
        self.stones.undo_move(cell);
        self.analysis = None;
        Ok(())
    }

    fn showboard(&self) -> Result<()> {
        println!("{}", self.stones.print());
        Ok(())
    }

    fn vc_between(&mut self, args: &[&str]) -> Result<()> {
        let color = Color::parse(args.first().ok_or_else(|| anyhow!("no colour provided"))?)?
            .ok_or_else(|| anyhow!("colour must be black or white"))?;
        let x: HexPoint = args
            .get(1)
            .ok_or_else(|| anyhow!("no first endpoint"))?
            .parse()?;
        let y: HexPoint = args
            .get(2)
            .ok_or_else(|| anyhow!("no second endpoint"))?
            .parse()?;
        let kind: VcKind = args.get(3).copied().unwrap_or("full").parse()?;

        let board = self.analysis_for(color)?;
        let vcs = board.cons(color).between(board.groups(), x, y, kind);
        println!("{}", vcs.len());
        for vc in vcs {
            println!("{vc}");
        }
        Ok(())
    }

    fn mustplay(&mut self, args: &[&str]) -> Result<()> {
        let color = Color::parse(args.first().ok_or_else(|| anyhow!("no colour provided"))?)?
            .ok_or_else(|| anyhow!("colour must be black or white"))?;
        let board = self.analysis_for(color)?;
        let mustplay = board.get_mustplay(color);
        println!("{}", mustplay.iter().map(|p| p.to_string()).join(" "));
        Ok(())
    }

    fn fillin(&mut self, args: &[&str]) -> Result<()> {
        let color = Color::parse(args.first().ok_or_else(|| anyhow!("no colour provided"))?)?
            .ok_or_else(|| anyhow!("colour must be black or white"))?;
        let board = self.analysis_for(color)?;
        let inf = board.inferior_cells();
        println!("dead {}", inf.dead());
        for c in Color::both() {
            println!("captured-{c} {}", inf.captured(c));
        }
        println!("vulnerable {}", inf.vulnerable());
        println!("dominated {}", inf.dominated());
        Ok(())
    }

    fn solve(&mut self, args: &[&str]) -> Result<()> {
        let color = Color::parse(args.first().ok_or_else(|| anyhow!("no colour provided"))?)?
            .ok_or_else(|| anyhow!("colour must be black or white"))?;
        if let Some(seconds) = args.get(1) {
            self.solver.param_mut().time_limit = Some(Duration::from_secs(seconds.parse()?));
        }
        if self.stones.whose_turn() != color && !self.moves.is_empty() {
            log::info!("solving for {color} out of turn");
        }

        // the analysis board is consumed by the search
        let mut board = self.build_analysis()?;
        self.analysis = None;
        let (result, solution) = self.solver.solve(&mut board, color);

        println!("{result}");
        println!("pv {}", solution.pv.iter().map(|p| p.to_string()).join(" "));
        println!("proof {}", solution.proof);
        Ok(())
    }

    fn swap_check(&mut self, args: &[&str]) -> Result<()> {
        let cell: HexPoint = args
            .first()
            .ok_or_else(|| anyhow!("no cell provided"))?
            .parse()?;
        println!("{}", self.swap.play_swap(self.geom, cell));
        Ok(())
    }

    // analysis plumbing

    /// Replays the game record onto a fresh analysis board.
    fn build_analysis(&self) -> Result<HexBoard<'static>> {
        let mut board = HexBoard::new(self.geom, self.ice);
        board.builder_param_mut().max_ors = self.config.max_ors;
        board.builder_param_mut().use_patterns = self.config.vc_patterns;

        // replay cheaply; the compute pass below builds everything
        let settings = *board.settings();
        board.settings_mut().use_vcs = false;
        board.settings_mut().use_ice = false;
        board.settings_mut().use_decompositions = false;
        for &(color, cell) in &self.moves {
            board.play_move(color, cell);
        }
        *board.settings_mut() = settings;
        Ok(board)
    }

    fn analysis_for(&mut self, to_play: Color) -> Result<&HexBoard<'static>> {
        let stale = match &self.analysis {
            Some((_, computed_for)) => *computed_for != to_play,
            None => true,
        };
        if stale {
            let mut board = self.build_analysis()?;
            board.compute_all(to_play, EndgameFillin::DoNotRemoveWinningFillin);
            self.analysis = Some((board, to_play));
        }
        Ok(&self.analysis.as_ref().unwrap().0)
    }

    // stream footers

    fn err(&self, err: &Error) -> Result<()> {
        println!("err\n{}", err);
        self.ok()
    }

    fn ok(&self) -> Result<()> {
        println!("ok");
        Ok(())
    }
}
