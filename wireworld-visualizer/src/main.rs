use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::{debug, info};
use palette::Srgb;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use wireworld_common::{CellState, Snapshot, SnapshotFormat};

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about = "Render a saved Wireworld grid to a PNG image", long_about = None)]
struct Args {
    /// Input snapshot file path (.wire)
    #[arg(short, long)]
    input: PathBuf,

    /// Output image path (.png)
    #[arg(short, long, default_value = "wireworld.png")]
    output: PathBuf,

    /// Encoding of the input snapshot
    #[arg(long, value_enum, default_value_t = FormatArg::Bincode)]
    format: FormatArg,

    /// Edge length of one cell in pixels
    #[arg(long, default_value_t = 12)]
    cell_size: u32,

    /// Leave a one-pixel gap between cells
    #[arg(long)]
    grid_lines: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Bincode,
    Json,
    Messagepack,
}

impl From<FormatArg> for SnapshotFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Bincode => SnapshotFormat::Bincode,
            FormatArg::Json => SnapshotFormat::Json,
            FormatArg::Messagepack => SnapshotFormat::MessagePack,
        }
    }
}

/// Display color of each cell state
fn state_color(state: CellState) -> Rgb<u8> {
    let color: Srgb<u8> = match state {
        CellState::Empty => palette::named::BLACK,
        CellState::Wire => palette::named::GRAY,
        CellState::ElectronHead => palette::named::BLUE,
        CellState::ElectronTail => palette::named::RED,
    };
    Rgb([color.red, color.green, color.blue])
}

/// Draw one snapshot, one square per cell, row 0 at the top
fn draw_snapshot(snapshot: &Snapshot, cell_size: u32, grid_lines: bool) -> RgbImage {
    let mut image = RgbImage::from_pixel(
        snapshot.width * cell_size,
        snapshot.height * cell_size,
        state_color(CellState::Empty),
    );
    let square = if grid_lines && cell_size > 1 { cell_size - 1 } else { cell_size };

    for (coord, state) in snapshot.active_cells() {
        let rect = Rect::at((coord.x * cell_size) as i32, (coord.y * cell_size) as i32).of_size(square, square);
        draw_filled_rect_mut(&mut image, rect, state_color(state));
    }
    image
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    debug!("Arguments: {:?}", args);

    if args.cell_size == 0 {
        anyhow::bail!("cell_size must be at least 1.");
    }

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open snapshot '{}'", args.input.display()))?;
    let snapshot = Snapshot::decode(args.format.into(), BufReader::new(file))
        .with_context(|| format!("Failed to decode snapshot '{}'", args.input.display()))?;
    info!(
        "Loaded {}x{} grid with {} active cells.",
        snapshot.width,
        snapshot.height,
        snapshot.active_cells().count()
    );

    let image = draw_snapshot(&snapshot, args.cell_size, args.grid_lines);
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write image '{}'", args.output.display()))?;
    info!("Image written to {} ({}x{} px).", args.output.display(), image.width(), image.height());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_drawn_at_their_coordinates() {
        let mut cells = vec![CellState::Empty; 6];
        cells[1] = CellState::Wire;
        cells[5] = CellState::ElectronHead;
        let snapshot = Snapshot::new(3, 2, cells).unwrap();

        let image = draw_snapshot(&snapshot, 4, false);
        assert_eq!(image.dimensions(), (12, 8));
        assert_eq!(*image.get_pixel(0, 0), state_color(CellState::Empty));
        assert_eq!(*image.get_pixel(5, 2), state_color(CellState::Wire));
        assert_eq!(*image.get_pixel(11, 7), state_color(CellState::ElectronHead));
    }

    #[test]
    fn grid_lines_leave_a_gap() {
        let snapshot = Snapshot::new(1, 1, vec![CellState::ElectronTail]).unwrap();
        let image = draw_snapshot(&snapshot, 4, true);
        assert_eq!(*image.get_pixel(2, 2), state_color(CellState::ElectronTail));
        assert_eq!(*image.get_pixel(3, 3), state_color(CellState::Empty));
    }
}
