use palette::color_difference::Ciede2000;
use palette::{Lab, Srgb};
use serde::Serialize;

use crate::color::{HexColor, to_lab};

/// Closest notable color to a swatch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorName {
    pub name: &'static str,
    pub hex: HexColor,
    /// CIEDE2000 difference from the queried color.
    pub distance: f32,
}

/// Find the nearest named color using CIEDE2000 in Lab.
pub fn nearest_name(color: &HexColor) -> ColorName {
    let target = to_lab(color.to_rgb());
    let mut best: Option<(&'static str, u32, f32)> = None;
    for &(name, rgb) in NAMED_COLORS {
        let distance = target.difference(lab_of(rgb));
        match best {
            Some((_, _, d)) if d <= distance => {}
            _ => best = Some((name, rgb, distance)),
        }
    }
    // The table is never empty.
    let (name, rgb, distance) = best.unwrap_or(("Black", 0x000000, f32::INFINITY));
    ColorName {
        name,
        hex: HexColor::from_rgb(unpack(rgb)),
        distance,
    }
}

fn unpack(rgb: u32) -> Srgb<u8> {
    Srgb::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

fn lab_of(rgb: u32) -> Lab {
    to_lab(unpack(rgb))
}

/// CSS / X11 named colors.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("Alice Blue", 0xf0f8ff),
    ("Antique White", 0xfaebd7),
    ("Aqua", 0x00ffff),
    ("Aquamarine", 0x7fffd4),
    ("Azure", 0xf0ffff),
    ("Beige", 0xf5f5dc),
    ("Bisque", 0xffe4c4),
    ("Black", 0x000000),
    ("Blanched Almond", 0xffebcd),
    ("Blue", 0x0000ff),
    ("Blue Violet", 0x8a2be2),
    ("Brown", 0xa52a2a),
    ("Burly Wood", 0xdeb887),
    ("Cadet Blue", 0x5f9ea0),
    ("Chartreuse", 0x7fff00),
    ("Chocolate", 0xd2691e),
    ("Coral", 0xff7f50),
    ("Cornflower Blue", 0x6495ed),
    ("Cornsilk", 0xfff8dc),
    ("Crimson", 0xdc143c),
    ("Dark Blue", 0x00008b),
    ("Dark Cyan", 0x008b8b),
    ("Dark Goldenrod", 0xb8860b),
    ("Dark Gray", 0xa9a9a9),
    ("Dark Green", 0x006400),
    ("Dark Khaki", 0xbdb76b),
    ("Dark Magenta", 0x8b008b),
    ("Dark Olive Green", 0x556b2f),
    ("Dark Orange", 0xff8c00),
    ("Dark Orchid", 0x9932cc),
    ("Dark Red", 0x8b0000),
    ("Dark Salmon", 0xe9967a),
    ("Dark Sea Green", 0x8fbc8f),
    ("Dark Slate Blue", 0x483d8b),
    ("Dark Slate Gray", 0x2f4f4f),
    ("Dark Turquoise", 0x00ced1),
    ("Dark Violet", 0x9400d3),
    ("Deep Pink", 0xff1493),
    ("Deep Sky Blue", 0x00bfff),
    ("Dim Gray", 0x696969),
    ("Dodger Blue", 0x1e90ff),
    ("Firebrick", 0xb22222),
    ("Floral White", 0xfffaf0),
    ("Forest Green", 0x228b22),
    ("Gainsboro", 0xdcdcdc),
    ("Ghost White", 0xf8f8ff),
    ("Gold", 0xffd700),
    ("Goldenrod", 0xdaa520),
    ("Gray", 0x808080),
    ("Green", 0x008000),
    ("Green Yellow", 0xadff2f),
    ("Honeydew", 0xf0fff0),
    ("Hot Pink", 0xff69b4),
    ("Indian Red", 0xcd5c5c),
    ("Indigo", 0x4b0082),
    ("Ivory", 0xfffff0),
    ("Khaki", 0xf0e68c),
    ("Lavender", 0xe6e6fa),
    ("Lavender Blush", 0xfff0f5),
    ("Lawn Green", 0x7cfc00),
    ("Lemon Chiffon", 0xfffacd),
    ("Light Blue", 0xadd8e6),
    ("Light Coral", 0xf08080),
    ("Light Cyan", 0xe0ffff),
    ("Light Goldenrod Yellow", 0xfafad2),
    ("Light Gray", 0xd3d3d3),
    ("Light Green", 0x90ee90),
    ("Light Pink", 0xffb6c1),
    ("Light Salmon", 0xffa07a),
    ("Light Sea Green", 0x20b2aa),
    ("Light Sky Blue", 0x87cefa),
    ("Light Slate Gray", 0x778899),
    ("Light Steel Blue", 0xb0c4de),
    ("Light Yellow", 0xffffe0),
    ("Lime", 0x00ff00),
    ("Lime Green", 0x32cd32),
    ("Linen", 0xfaf0e6),
    ("Magenta", 0xff00ff),
    ("Maroon", 0x800000),
    ("Medium Aquamarine", 0x66cdaa),
    ("Medium Blue", 0x0000cd),
    ("Medium Orchid", 0xba55d3),
    ("Medium Purple", 0x9370db),
    ("Medium Sea Green", 0x3cb371),
    ("Medium Slate Blue", 0x7b68ee),
    ("Medium Spring Green", 0x00fa9a),
    ("Medium Turquoise", 0x48d1cc),
    ("Medium Violet Red", 0xc71585),
    ("Midnight Blue", 0x191970),
    ("Mint Cream", 0xf5fffa),
    ("Misty Rose", 0xffe4e1),
    ("Moccasin", 0xffe4b5),
    ("Navajo White", 0xffdead),
    ("Navy", 0x000080),
    ("Old Lace", 0xfdf5e6),
    ("Olive", 0x808000),
    ("Olive Drab", 0x6b8e23),
    ("Orange", 0xffa500),
    ("Orange Red", 0xff4500),
    ("Orchid", 0xda70d6),
    ("Pale Goldenrod", 0xeee8aa),
    ("Pale Green", 0x98fb98),
    ("Pale Turquoise", 0xafeeee),
    ("Pale Violet Red", 0xdb7093),
    ("Papaya Whip", 0xffefd5),
    ("Peach Puff", 0xffdab9),
    ("Peru", 0xcd853f),
    ("Pink", 0xffc0cb),
    ("Plum", 0xdda0dd),
    ("Powder Blue", 0xb0e0e6),
    ("Purple", 0x800080),
    ("Rebecca Purple", 0x663399),
    ("Red", 0xff0000),
    ("Rosy Brown", 0xbc8f8f),
    ("Royal Blue", 0x4169e1),
    ("Saddle Brown", 0x8b4513),
    ("Salmon", 0xfa8072),
    ("Sandy Brown", 0xf4a460),
    ("Sea Green", 0x2e8b57),
    ("Seashell", 0xfff5ee),
    ("Sienna", 0xa0522d),
    ("Silver", 0xc0c0c0),
    ("Sky Blue", 0x87ceeb),
    ("Slate Blue", 0x6a5acd),
    ("Slate Gray", 0x708090),
    ("Snow", 0xfffafa),
    ("Spring Green", 0x00ff7f),
    ("Steel Blue", 0x4682b4),
    ("Tan", 0xd2b48c),
    ("Teal", 0x008080),
    ("Thistle", 0xd8bfd8),
    ("Tomato", 0xff6347),
    ("Turquoise", 0x40e0d0),
    ("Violet", 0xee82ee),
    ("Wheat", 0xf5deb3),
    ("White", 0xffffff),
    ("White Smoke", 0xf5f5f5),
    ("Yellow", 0xffff00),
    ("Yellow Green", 0x9acd32),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(hex: &str) -> ColorName {
        nearest_name(&hex.parse().unwrap())
    }

    #[test]
    fn exact_match_has_zero_distance() {
        let named = name_of("#FF0000");
        assert_eq!(named.name, "Red");
        assert_eq!(named.hex.as_str(), "#ff0000");
        assert!(named.distance.abs() < 1e-3);
    }

    #[test]
    fn near_colors_snap_to_closest_name() {
        assert_eq!(name_of("#fefefe").name, "White");
        assert_eq!(name_of("#010203").name, "Black");
        assert_eq!(name_of("#000082").name, "Navy");
    }

    #[test]
    fn distance_grows_with_offset() {
        let close = name_of("#fa0000");
        let far = name_of("#e00000");
        assert_eq!(close.name, "Red");
        assert!(close.distance < far.distance || far.name != "Red");
    }

    #[test]
    fn table_entries_are_unique() {
        for (i, (name, _)) in NAMED_COLORS.iter().enumerate() {
            assert!(NAMED_COLORS[i + 1..].iter().all(|(other, _)| other != name), "{name}");
        }
    }
}
