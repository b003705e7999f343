use crate::markup::Color;

pub fn sender_color(user_id: &str) -> Color {
    const PALETTE: [(u8, u8, u8); 8] = [
        (78, 169, 220),  // sky blue
        (220, 105, 90),  // coral
        (101, 186, 130), // sage
        (165, 132, 217), // lavender
        (212, 160, 60),  // amber
        (66, 189, 189),  // teal
        (213, 120, 165), // rose
        (145, 186, 65),  // lime
    ];
    let idx = hash_user_id(user_id) % PALETTE.len();
    let (r, g, b) = PALETTE[idx];
    Color::rgb(r, g, b)
}

/// 24-bit ANSI foreground escape for terminal output.
pub fn ansi_fg(color: Color) -> String {
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

pub const ANSI_RESET: &str = "\x1b[0m";

fn hash_user_id(user_id: &str) -> usize {
    let mut hash: u32 = 2_166_136_261u32; // FNV-1a offset basis
    for byte in user_id.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16_777_619); // FNV prime
    }
    hash as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_is_stable_per_user() {
        assert_eq!(sender_color("@alice:example.org"), sender_color("@alice:example.org"));
        assert_eq!(ansi_fg(Color::rgb(1, 2, 3)), "\x1b[38;2;1;2;3m");
    }
}
