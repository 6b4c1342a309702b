use organized_pieces::changes::{Apply, Changelist};
use organized_pieces::config::StoreConfig;
use organized_pieces::core::coord::{Coord, DIAGONALS, ORTHOGONALS};
use organized_pieces::core::piece::{Player, PieceType, RawType};
use organized_pieces::organized::OrganizedPieces;
use organized_pieces::position::Position;
use organized_pieces::slack::SlackPolicy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SPREAD: i64 = 50;

fn usage() -> ! {
    eprintln!("Usage: churn [steps] [--seed <N>] [--editor]");
    std::process::exit(2);
}

fn start_position() -> Position {
    let mut pos = Position::new()
        .with(Coord::new(5, 1), PieceType::new(RawType::King, Player::White))
        .with(Coord::new(5, 8), PieceType::new(RawType::King, Player::Black))
        .with(Coord::new(4, 1), PieceType::new(RawType::Queen, Player::White))
        .with(Coord::new(4, 8), PieceType::new(RawType::Queen, Player::Black));
    for x in 1..=8 {
        pos.insert(Coord::new(x, 2), PieceType::new(RawType::Pawn, Player::White));
        pos.insert(Coord::new(x, 7), PieceType::new(RawType::Pawn, Player::Black));
    }
    pos
}

fn random_square(rng: &mut ChaCha8Rng) -> Coord {
    Coord::new(rng.gen_range(-SPREAD..=SPREAD), rng.gen_range(-SPREAD..=SPREAD))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut steps: usize = 10_000;
    let mut seed: u64 = 0;
    let mut editor = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                let Some(v) = args.get(i + 1) else {
                    eprintln!("--seed requires an integer argument");
                    std::process::exit(2);
                };
                seed = match v.parse() {
                    Ok(s) => s,
                    Err(e) => {
                        eprintln!("invalid --seed {v}: {e}");
                        std::process::exit(2);
                    }
                };
                i += 2;
            }
            "--editor" => {
                editor = true;
                i += 1;
            }
            x if !x.starts_with("--") => {
                steps = match x.parse() {
                    Ok(n) => n,
                    Err(e) => {
                        eprintln!("invalid step count {x}: {e}");
                        std::process::exit(2);
                    }
                };
                i += 1;
            }
            _ => usage(),
        }
    }

    let queens = [
        PieceType::new(RawType::Queen, Player::White),
        PieceType::new(RawType::Queen, Player::Black),
    ];
    let mut cfg = StoreConfig::new()
        .with_editor(editor)
        .with_slides(&ORTHOGONALS)
        .with_slides(&DIAGONALS);
    for q in queens {
        cfg = cfg.with_type(q, SlackPolicy::Promotion);
    }
    let types = [
        queens[0],
        queens[1],
        PieceType::new(RawType::Knight, Player::White),
        PieceType::new(RawType::Pawn, Player::Black),
    ];

    let mut pieces = match OrganizedPieces::allocate(&start_position(), &cfg) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("allocation failed: {e}");
            std::process::exit(1);
        }
    };
    let start_slots = pieces.slot_count();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (mut adds, mut deletes, mut moves, mut captures) = (0, 0, 0, 0);
    let (mut skipped, mut regenerations) = (0, 0);
    for step in 0..steps {
        let live = pieces.live_count();
        let pick = rng.gen_range(0..3);
        let mut list = if pick == 0 || live == 0 {
            let ty = types[rng.gen_range(0..types.len())];
            let to = random_square(&mut rng);
            if pieces.lookup(to).is_some() {
                skipped += 1;
                continue;
            }
            adds += 1;
            Changelist::new().add(ty, to)
        } else {
            let Some(piece) = pieces.iter_live().nth(rng.gen_range(0..live)) else {
                skipped += 1;
                continue;
            };
            if pick == 1 {
                deletes += 1;
                Changelist::new().delete(piece)
            } else {
                let to = random_square(&mut rng);
                match pieces.piece_at(to) {
                    Some(target) if target.slot == piece.slot => {
                        skipped += 1;
                        continue;
                    }
                    Some(target) => {
                        captures += 1;
                        Changelist::new().capture(piece.slot, piece.coords, target)
                    }
                    None => {
                        moves += 1;
                        Changelist::new().move_piece(piece.slot, piece.coords, to)
                    }
                }
            }
        };

        match list.apply_forward_growing(&mut pieces) {
            Ok(Some(_)) => regenerations += 1,
            Ok(None) => {}
            Err(e) => {
                eprintln!("step {step}: {e}");
                std::process::exit(1);
            }
        }
        // every tenth step is undone and redone
        if step % 10 == 9 {
            let undo = list
                .apply(&mut pieces, Apply::Backward)
                .and_then(|()| list.apply(&mut pieces, Apply::Forward));
            if let Err(e) = undo {
                eprintln!("step {step}: undo/redo failed: {e}");
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = pieces.validate() {
        eprintln!("store corrupted: {e}");
        std::process::exit(1);
    }

    println!("Steps: {steps} (seed {seed}, editor {editor})");
    println!("Adds: {adds}, deletes: {deletes}, moves: {moves}, captures: {captures}");
    println!("Skipped: {skipped}");
    println!("Regenerations: {regenerations} (generation {})", pieces.generation());
    println!("Slots: {start_slots} -> {}", pieces.slot_count());
    println!("Live pieces: {}", pieces.live_count());
    for ty in pieces.types() {
        println!(
            "  {ty}: {} live, {} vacant",
            pieces.count_of(ty),
            pieces.vacancies(ty).len()
        );
    }
    for dir in pieces.directions() {
        println!(
            "  line entries along {}: {}",
            dir.vector(),
            pieces.line_index().entry_count(*dir)
        );
    }
}
