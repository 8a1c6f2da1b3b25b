//! Command-line front end for the extraction engine: one subcommand per
//! engine operation, PNG out for pixels, plain text for listings.

mod png;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;

use sxr_core::gfx::palette::{read_palette, SPRITE_PALETTE_LEN};
use sxr_core::level::{assemble_level, graphic_info, Entrance};
use sxr_core::script::{self, anim, entity};
use sxr_core::sprite::{decode_sprite, scan_sprites};
use sxr_core::{trace, Addr, GameConstants, Rom};

#[derive(Parser)]
#[command(name = "sxrom")]
#[command(version, about = "SNES ROM asset extraction tool", long_about = None)]
struct Cli {
    /// ROM image (a 512-byte copier header is stripped automatically)
    rom: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the internal cartridge header
    Info,

    /// Render a palette as a strip of color swatches
    Palette {
        /// Palette address ($BB:AAAA or linear hex)
        #[arg(value_parser = parse_addr)]
        addr: Addr,

        /// Number of color words to read
        #[arg(short, long, default_value_t = SPRITE_PALETTE_LEN)]
        length: usize,

        #[arg(short, long, default_value = "palette.png")]
        output: PathBuf,
    },

    /// Decode one sprite structure to PNG
    Sprite {
        /// Sprite table index
        index: Option<usize>,

        /// Decode from this address instead of the table entry
        #[arg(long, value_parser = parse_addr)]
        at: Option<Addr>,

        /// Palette address to render with
        #[arg(short, long, value_parser = parse_addr)]
        palette: Addr,

        #[arg(short, long, default_value = "sprite.png")]
        output: PathBuf,
    },

    /// Brute-force the whole image for valid sprite structures
    Scan,

    /// List an entity behavior script, following inheritance
    Entity {
        /// Entity table index
        index: usize,
    },

    /// List an animation script
    Anim {
        /// Animation table index
        index: usize,
    },

    /// Trace a subroutine and list its inlined instructions
    Trace {
        /// Entry point ($BB:AAAA or linear hex)
        #[arg(value_parser = parse_addr)]
        entry: Addr,

        /// Instruction budget
        #[arg(short, long, default_value_t = 1000)]
        budget: usize,
    },

    /// Assemble one level entrance into a PNG
    Level {
        /// Entrance index
        entrance: usize,

        #[arg(short, long, default_value = "level.png")]
        output: PathBuf,
    },
}

fn parse_addr(s: &str) -> Result<Addr, String> {
    let s = s.trim_start_matches('$');
    if let Some((bank, absolute)) = s.split_once(':') {
        let bank = u8::from_str_radix(bank, 16).map_err(|e| e.to_string())?;
        let absolute = u16::from_str_radix(absolute, 16).map_err(|e| e.to_string())?;
        Ok(Addr::from_bank_absolute(bank, absolute))
    } else {
        u32::from_str_radix(s.trim_start_matches("0x"), 16)
            .map(Addr::from_linear)
            .map_err(|e| e.to_string())
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let data = fs::read(&cli.rom).with_context(|| format!("reading {}", cli.rom.display()))?;
    let rom = Rom::new(data);
    let constants = GameConstants::us();

    match cli.command {
        Commands::Info => info(&rom),
        Commands::Palette { addr, length, output } => {
            let palette = read_palette(&rom, addr, length)?;
            let mut strip = sxr_core::gfx::ImageMatrix::new(palette.colors.len() * 8, 8);
            for (i, &color) in palette.colors.iter().enumerate() {
                for y in 0..8 {
                    for x in 0..8 {
                        strip.set(i * 8 + x, y, Some(color));
                    }
                }
            }
            png::save_png(&strip, &output)
        }
        Commands::Sprite { index, at, palette, output } => {
            let addr = match (at, index) {
                (Some(addr), _) => addr,
                (None, Some(index)) => script::sprite_address(&rom, &constants, index)?,
                (None, None) => anyhow::bail!("give a sprite table index or --at <addr>"),
            };
            let sprite = decode_sprite(&rom, addr)?;
            println!(
                "sprite at {}: {} parts, {} bytes",
                sprite.addr,
                sprite.parts.len(),
                sprite.byte_len()
            );
            let palette = read_palette(&rom, palette, SPRITE_PALETTE_LEN)?;
            png::save_png(&sprite.to_image(&palette)?, &output)
        }
        Commands::Scan => {
            let found = scan_sprites(&rom);
            for sprite in &found {
                println!(
                    "{}  {:2} large  {:2}+{:2} small  {:4} bytes",
                    sprite.addr,
                    sprite.header.large,
                    sprite.header.small1,
                    sprite.header.small2,
                    sprite.byte_len()
                );
            }
            println!("{} sprites found", found.len());
            Ok(())
        }
        Commands::Entity { index } => {
            let addr = script::entity_address(&rom, &constants, index)?;
            let root = entity::decode_entity(&rom, addr)?;
            print_entity(&root, 0);
            Ok(())
        }
        Commands::Anim { index } => {
            let addr = script::animation_address(&rom, &constants, index)?;
            let info = anim::decode_animation(&rom, addr)?;
            println!("animation at {}, {} bytes", info.addr, info.byte_len);
            for entry in &info.entries {
                match entry {
                    anim::AnimEntry::Command { opcode, params } => {
                        println!("  cmd {opcode:#04X} {params:02X?}")
                    }
                    anim::AnimEntry::SpriteDisplay { duration, sprite_index } => {
                        println!("  sprite {sprite_index} for {duration} frames")
                    }
                }
            }
            Ok(())
        }
        Commands::Trace { entry, budget } => {
            for insn in trace::trace(&rom, entry, budget)? {
                if insn.operand.is_empty() {
                    println!("{}  {}", insn.addr, insn.mnemonic);
                } else {
                    println!(
                        "{}  {} ${:X} {}",
                        insn.addr,
                        insn.mnemonic,
                        insn.operand_value(),
                        insn.call_target.map(|t| format!("-> {t}")).unwrap_or_default()
                    );
                }
            }
            Ok(())
        }
        Commands::Level { entrance, output } => {
            let record = Entrance::read(&rom, &constants, entrance)?;
            let graphics = graphic_info(&rom, &constants, record.terrain)?;
            println!(
                "entrance {entrance}: terrain {}, {} transfers, palette {}",
                record.terrain,
                graphics.transfers.len(),
                graphics.palette_addr
            );
            png::save_png(&assemble_level(&rom, &constants, entrance)?, &output)
        }
    }
}

fn info(rom: &Rom) -> Result<()> {
    let header = rom.header()?;
    println!("title:    {}", header.title);
    println!("size:     {} KiB", rom.len() / 1024);
    println!(
        "checksum: {:04X} / complement {:04X} ({})",
        header.checksum,
        header.complement,
        if header.checksum_ok() { "ok" } else { "BAD" }
    );
    Ok(())
}

fn print_entity(e: &entity::Entity, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}entity at {}, {} bytes", e.addr, e.byte_len);
    for command in &e.commands {
        println!("{indent}  {:#06X} {:04X?}", command.opcode, command.params);
    }
    for child in &e.children {
        print_entity(child, depth + 1);
    }
}
