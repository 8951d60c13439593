//! End-to-end scenarios for the engine core: swap handling, rotation
//! invariance, terminal detection, mustplay-driven solving, and the
//! reachable-state invariants of the connection sets.

use lib_hexis::hex::board::{EndgameFillin, HexBoard};
use lib_hexis::hex::consts::{Color, ColorFilter};
use lib_hexis::hex::coords::{HexPoint, NORTH, SOUTH};
use lib_hexis::hex::geometry::Geometry;
use lib_hexis::hex::ice::{ALL_COLORS, IceEngine, InferiorCells};
use lib_hexis::hex::patterns::PatternBoard;
use lib_hexis::hex::sets::PointSet;
use lib_hexis::hex::swap::SwapMoves;
use lib_hexis::hex::vc::VcKind;
use lib_hexis::solver::{SolveResult, Solver, SolverParam};

fn p(name: &str) -> HexPoint {
    name.parse().unwrap()
}

/// Builds an analysis board with the given stones played alternately
/// enough for tests; stones are placed as (colour, cell) pairs.
fn board_with<'a>(
    geom: &'a Geometry,
    ice: &'a IceEngine,
    stones: &[(Color, &str)],
    to_play: Color,
) -> HexBoard<'a> {
    let mut board = HexBoard::new(geom, ice);
    board.settings_mut().use_vcs = false;
    board.settings_mut().use_ice = false;
    board.settings_mut().use_decompositions = false;
    for &(color, cell) in stones {
        board.play_move(color, p(cell));
    }
    *board.settings_mut() = Default::default();
    board.compute_all(to_play, EndgameFillin::DoNotRemoveWinningFillin);
    board
}

// S1: the swap list decides whether the second player swaps.

#[test]
fn s1_swap_list_fits() {
    let swap = SwapMoves::parse("# strong openings\n8x8 f3\n").unwrap();
    let g = Geometry::new(8, 8).unwrap();
    assert!(swap.play_swap(&g, p("f3")));
    assert!(!swap.play_swap(&g, p("a1")));
}

// S2: inferior-cell classification commutes with board rotation.

#[test]
fn s2_fillin_is_rotation_invariant() {
    let g = Geometry::new(5, 5).unwrap();
    let ice = IceEngine::with_builtin_patterns();

    let whites = ["a1", "b1", "b2", "b3", "a4"];

    let mut plain = PatternBoard::new(&g);
    plain.start_new_game();
    for cell in whites {
        plain.play_move(Color::White, p(cell));
    }
    let mut inf = InferiorCells::new();
    ice.compute_fillin(Color::Black, &mut plain, &mut inf, ALL_COLORS);

    let mut rotated = PatternBoard::new(&g);
    rotated.start_new_game();
    for cell in whites {
        rotated.play_move(Color::White, g.rotate(p(cell)));
    }
    let mut inf_rot = InferiorCells::new();
    ice.compute_fillin(Color::Black, &mut rotated, &mut inf_rot, ALL_COLORS);

    assert_eq!(g.rotate_set(&inf.dead()), inf_rot.dead());
    for c in Color::both() {
        assert_eq!(
            g.rotate_set(&inf.captured(c)),
            inf_rot.captured(c),
            "captured cells for {c} do not rotate"
        );
    }
    // the original position captures the walled pair for white
    assert!(inf.captured(Color::White).contains(p("a2")));
}

// S3: a full connection exists between two locations exactly when one
// exists between their images in the rotated position.

#[test]
fn s3_connections_are_rotation_invariant() {
    let g = Geometry::new(3, 3).unwrap();
    let ice = IceEngine::with_builtin_patterns();

    let board = board_with(&g, &ice, &[(Color::Black, "b1")], Color::White);
    let rotated = board_with(&g, &ice, &[(Color::Black, "b3")], Color::White);

    for color in Color::both() {
        for (i, &x) in g.locations().iter().enumerate() {
            for &y in &g.locations()[..i] {
                for kind in VcKind::both() {
                    let here = board.cons(color).exists(board.groups(), x, y, kind);
                    let there = rotated.cons(color).exists(
                        rotated.groups(),
                        g.rotate(x),
                        g.rotate(y),
                        kind,
                    );
                    assert_eq!(
                        here, there,
                        "{color} {kind} between {x},{y} breaks under rotation"
                    );
                }
            }
        }
    }
}

// S6: a chain down a file joins black's edges; the incremental hash
// agrees with a batch recomputation.

#[test]
fn s6_terminal_win_and_hash() {
    let g = Geometry::new(5, 5).unwrap();
    let ice = IceEngine::with_builtin_patterns();
    let mut board = HexBoard::new(&g, &ice);
    board.settings_mut().use_ice = false;
    board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

    for cell in ["a1", "a2", "a3", "a4", "a5"] {
        board.play_move(Color::Black, p(cell));
    }
    assert!(board.is_game_over());
    assert_eq!(board.winner(), Some(Color::Black));
    assert_eq!(board.groups().captain(NORTH), board.groups().captain(SOUTH));

    // replay the same stones from scratch; the hashes must agree
    let mut batch = lib_hexis::hex::stoneboard::StoneBoard::new(&g);
    batch.start_new_game();
    for cell in ["a1", "a2", "a3", "a4", "a5"] {
        batch.play_move(Color::Black, p(cell));
    }
    assert_eq!(board.hash(), batch.hash());
}

// S5 and friends: solving.

#[test]
fn s5_empty_mustplay_means_loss() {
    // fill-in alone would already collapse this tiny board, so run the
    // connection machinery on its own
    let g = Geometry::new(2, 1).unwrap();
    let ice = IceEngine::with_builtin_patterns();
    let mut board = HexBoard::new(&g, &ice);
    board.settings_mut().use_ice = false;
    board.compute_all(Color::White, EndgameFillin::DoNotRemoveWinningFillin);
    assert!(board.get_mustplay(Color::White).is_empty());
    assert!(!board.is_game_over());

    let mut solver = Solver::new(SolverParam::default());
    let (result, solution) = solver.solve(&mut board, Color::White);
    assert_eq!(result, SolveResult::Loss);
    // the proof carries black's winning region
    assert!(solution.proof.contains(p("a1")));
    assert!(solution.proof.contains(p("b1")));
}

#[test]
fn solver_sees_through_a_splitting_wall() {
    let g = Geometry::new(3, 3).unwrap();
    let ice = IceEngine::with_builtin_patterns();
    let mut board = HexBoard::new(&g, &ice);
    board.settings_mut().use_ice = false;
    board.settings_mut().use_vcs = false;
    for cell in ["b1", "b2", "b3"] {
        board.play_move(Color::White, p(cell));
    }
    board.settings_mut().use_vcs = true;
    board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

    // the white wall splits black's side in two
    assert!(board.splitting_decomposition(Color::White).is_some());

    // whichever file black starts, white answers inside it; the wall
    // already joins white's edges virtually, so black is lost
    let mut solver = Solver::new(SolverParam::default());
    let (result, _) = solver.solve(&mut board, Color::Black);
    assert_eq!(result, SolveResult::Loss);
}

// Reachable-state invariants over the connection sets.

fn check_connection_invariants(board: &HexBoard<'_>, color: Color) {
    let groups = board.groups();
    let brd = board.board();
    let captains = groups.groups(ColorFilter::NotColor(-color));

    for (i, &x) in captains.iter().enumerate() {
        for &y in &captains[..i] {
            for kind in VcKind::both() {
                let list = board.cons(color).list(kind, x, y);

                // the cached soft intersection equals a recomputation
                let mut expect = PointSet::ALL;
                for (n, vc) in list.iter().enumerate() {
                    if n >= list.soft_limit() {
                        break;
                    }
                    expect &= vc.carrier();
                }
                assert_eq!(list.soft_intersection(), expect);

                for vc in list.iter() {
                    // endpoints are never inside carriers, and never
                    // opponent stones
                    assert!(!vc.carrier().contains(x));
                    assert!(!vc.carrier().contains(y));
                    assert!(brd.color_of(x) != Some(-color));
                    assert!(brd.color_of(y) != Some(-color));
                    if kind == VcKind::Semi {
                        assert!(vc.carrier().contains(vc.key()));
                    }
                }

                // no member's carrier is a proper subset of another's
                for (a, va) in list.iter().enumerate() {
                    for (b, vb) in list.iter().enumerate() {
                        if a != b {
                            assert!(
                                !(va.carrier().is_subset_of(&vb.carrier())
                                    && va.carrier() != vb.carrier()),
                                "{va} is a proper subset of {vb}"
                            );
                        }
                    }
                }
            }

            // no semi's carrier contains a full's carrier
            let fulls = board.cons(color).list(VcKind::Full, x, y);
            let semis = board.cons(color).list(VcKind::Semi, x, y);
            for semi in semis.iter() {
                for full in fulls.iter() {
                    assert!(
                        !full.carrier().is_subset_of(&semi.carrier()),
                        "semi {semi} is a superset of full {full}"
                    );
                }
            }
        }
    }
}

#[test]
fn connection_invariants_hold_in_reachable_states() {
    let g = Geometry::new(3, 3).unwrap();
    let ice = IceEngine::with_builtin_patterns();
    let mut board = HexBoard::new(&g, &ice);
    board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

    for c in Color::both() {
        check_connection_invariants(&board, c);
    }

    let line = [
        (Color::Black, "b2"),
        (Color::White, "b1"),
        (Color::Black, "a2"),
        (Color::White, "c2"),
    ];
    for (color, cell) in line {
        board.play_move(color, p(cell));
        for c in Color::both() {
            check_connection_invariants(&board, c);
        }
    }
    for _ in 0..line.len() {
        board.undo_move();
        for c in Color::both() {
            check_connection_invariants(&board, c);
        }
    }
}

#[test]
fn play_undo_restores_everything() {
    let g = Geometry::new(4, 4).unwrap();
    let ice = IceEngine::with_builtin_patterns();
    let mut board = HexBoard::new(&g, &ice);
    board.compute_all(Color::Black, EndgameFillin::DoNotRemoveWinningFillin);

    let hash = board.hash();
    let black = board.board().black();
    let white = board.board().white();
    let dead = board.dead();
    let cons_b = board.cons(Color::Black).clone();
    let cons_w = board.cons(Color::White).clone();

    board.play_move(Color::Black, p("b2"));
    board.play_move(Color::White, p("c2"));
    board.play_move(Color::Black, p("b3"));
    board.undo_move();
    board.undo_move();
    board.undo_move();

    assert_eq!(board.hash(), hash);
    assert_eq!(board.board().black(), black);
    assert_eq!(board.board().white(), white);
    assert_eq!(board.dead(), dead);
    assert!(*board.cons(Color::Black) == cons_b);
    assert!(*board.cons(Color::White) == cons_w);
}

#[test]
fn winning_proofs_shrink_to_live_cells() {
    // invariant 8: after giving the loser everything outside the proof
    // and filling in, no proof cell is dead or captured by the loser
    let g = Geometry::new(3, 3).unwrap();
    let ice = IceEngine::with_builtin_patterns();
    let mut board = HexBoard::new(&g, &ice);
    let mut solver = Solver::new(SolverParam::default());
    let (result, solution) = solver.solve(&mut board, Color::Black);
    assert_eq!(result, SolveResult::Win);

    let mut scratch = PatternBoard::new(&g);
    scratch.start_new_game();
    scratch.add_fillin(Color::White, g.cells() - solution.proof);
    let mut inf = InferiorCells::new();
    ice.compute_fillin(
        Color::White,
        &mut scratch,
        &mut inf,
        lib_hexis::hex::ice::only(Color::White),
    );
    let filled = inf.dead() | inf.captured(Color::White);
    assert!(
        !filled.intersects(&solution.proof),
        "proof cells {} were filled in",
        filled & solution.proof
    );
}
