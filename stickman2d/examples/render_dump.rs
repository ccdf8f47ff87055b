use stickman2d::{Color, Skeleton};
use std::{env, path::Path};

fn usage() -> ! {
    eprintln!(
        "Usage:\n  render_dump <skeleton.json> <atlas.atlas> [--anim <name>] [--time <seconds>] [--loop 0|1]\n           [--x <px>] [--y <px>] [--scale <s>] [--flip 0|1] [--no-nudges]\n"
    );
    std::process::exit(2);
}

fn main() {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        usage();
    }

    let skeleton_path = Path::new(&args[0]).to_path_buf();
    let atlas_path = Path::new(&args[1]).to_path_buf();
    args.drain(0..2);

    let mut anim: Option<String> = None;
    let mut time: f32 = 0.0;
    let mut looped = true;
    let mut x = 0.0f32;
    let mut y = 0.0f32;
    let mut scale = 1.0f32;
    let mut flip_x = false;
    let mut nudges = true;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--anim" if i + 1 < args.len() => {
                anim = Some(args[i + 1].to_string());
                i += 2;
            }
            "--time" if i + 1 < args.len() => {
                time = args[i + 1].parse::<f32>().unwrap_or(0.0);
                i += 2;
            }
            "--loop" if i + 1 < args.len() => {
                looped = args[i + 1].parse::<i32>().unwrap_or(1) != 0;
                i += 2;
            }
            "--x" if i + 1 < args.len() => {
                x = args[i + 1].parse::<f32>().unwrap_or(0.0);
                i += 2;
            }
            "--y" if i + 1 < args.len() => {
                y = args[i + 1].parse::<f32>().unwrap_or(0.0);
                i += 2;
            }
            "--scale" if i + 1 < args.len() => {
                scale = args[i + 1].parse::<f32>().unwrap_or(1.0);
                i += 2;
            }
            "--flip" if i + 1 < args.len() => {
                flip_x = args[i + 1].parse::<i32>().unwrap_or(0) != 0;
                i += 2;
            }
            "--no-nudges" => {
                nudges = false;
                i += 1;
            }
            _ => usage(),
        }
    }

    let mut skeleton = Skeleton::new();
    if !nudges {
        skeleton.slot_nudges = stickman2d::SlotNudges::none();
    }
    skeleton
        .load(&skeleton_path, &atlas_path)
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(2);
        });

    if let Some(anim) = anim.as_deref() {
        skeleton.set_animation(anim, looped, true).unwrap_or_else(|e| {
            eprintln!("failed to set animation {anim}: {e}");
            std::process::exit(2);
        });
    }
    skeleton.update(time);

    let draws = skeleton.draw_commands(x, y, scale, Color::WHITE, flip_x);
    let output = serde_json::json!({
        "anim": skeleton.current_animation(),
        "time": skeleton.time(),
        "looped": skeleton.is_looping(),
        "draws": draws,
    });
    match serde_json::to_string(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("failed to serialize draw list: {e}");
            std::process::exit(1);
        }
    }
}
