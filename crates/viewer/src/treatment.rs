use std::fmt::{self, Display, Formatter};

use viewer_asset::material::MaterialAsset;

#[inline]
fn srgb_to_linear(component: f32) -> f32 {
    if component <= 0.04045 {
        component / 12.92
    } else {
        ((component + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(component: f32) -> f32 {
    let component = component.clamp(0.0, 1.0);
    if component <= 0.0031308 {
        component * 12.92
    } else {
        1.055 * component.powf(1.0 / 2.4) - 0.055
    }
}

/// A named shading configuration a node can be displayed with.
///
/// Colors are stored in linear space, as GLTF factors are.
#[derive(Debug, Clone, PartialEq)]
pub struct Treatment {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
}

impl Treatment {
    /// A plain dielectric treatment from an sRGB `0xRRGGBB` color.
    pub fn from_srgb_hex(name: &str, hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self {
            name: name.to_string(),
            base_color: [channel(16), channel(8), channel(0), 1.0],
            metallic: 0.1,
            roughness: 0.6,
            emissive: [0.0; 3],
        }
    }

    /// The treatment a freshly loaded primitive is displayed with.
    pub fn from_material(material: &MaterialAsset) -> Self {
        let name = match (&material.name, material.index) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(index)) => format!("Material #{}", index),
            (_, None) => String::from("Default"),
        };
        Self {
            name,
            base_color: material.base_color_factor,
            metallic: material.metallic_factor,
            roughness: material.roughness_factor,
            emissive: material.emissive_factor,
        }
    }

    /// Fallback for nodes that were never given a treatment.
    pub fn default_gray() -> Self {
        Self::from_srgb_hex("Default", 0xcccccc)
    }

    pub fn hover() -> Self {
        Self {
            emissive: [0.05, 0.12, 0.2],
            ..Self::from_srgb_hex("Hover", 0x44aaff)
        }
    }

    /// `#RRGGBB` of the base color in sRGB.
    pub fn hex(&self) -> String {
        let [red, green, blue] = self.srgb_u8();
        format!("#{:02X}{:02X}{:02X}", red, green, blue)
    }

    pub fn srgb_u8(&self) -> [u8; 3] {
        let [red, green, blue, _] = self
            .base_color
            .map(|component| (linear_to_srgb(component) * 255.0).round() as u8);
        [red, green, blue]
    }
}

impl Display for Treatment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, metallic {:.2}, roughness {:.2})",
            self.name,
            self.hex(),
            self.metallic,
            self.roughness
        )
    }
}

/// The fixed set of override colors offered in the context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<Treatment>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(vec![
            Treatment::from_srgb_hex("Red", 0xff0000),
            Treatment::from_srgb_hex("Green", 0x00ff00),
            Treatment::from_srgb_hex("Blue", 0x0000ff),
            Treatment::from_srgb_hex("Yellow", 0xffff00),
            Treatment::from_srgb_hex("Orange", 0xffa500),
            Treatment::from_srgb_hex("Purple", 0x800080),
        ])
    }
}

impl Palette {
    pub fn new(entries: Vec<Treatment>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Treatment] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Treatment> {
        self.entries.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&Treatment> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

#[cfg(test)]
mod test {
    use viewer_asset::material::MaterialAsset;

    use super::{Palette, Treatment};

    #[test]
    fn hex_survives_linear_conversion() {
        let red = Treatment::from_srgb_hex("Red", 0xff0000);
        assert_eq!(red.hex(), "#FF0000");
        let orange = Treatment::from_srgb_hex("Orange", 0xffa500);
        assert_eq!(orange.hex(), "#FFA500");
        assert_eq!(orange.srgb_u8(), [0xff, 0xa5, 0x00]);
    }

    #[test]
    fn material_names_fall_back_to_index() {
        let named = MaterialAsset {
            name: Some(String::from("Steel")),
            index: Some(3),
            ..Default::default()
        };
        assert_eq!(Treatment::from_material(&named).name, "Steel");

        let unnamed = MaterialAsset {
            index: Some(3),
            ..Default::default()
        };
        assert_eq!(Treatment::from_material(&unnamed).name, "Material #3");

        let implicit = MaterialAsset::default();
        let treatment = Treatment::from_material(&implicit);
        assert_eq!(treatment.name, "Default");
        assert_eq!(treatment.base_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn default_palette_is_addressable() {
        let palette = Palette::default();
        assert_eq!(palette.entries().len(), 6);
        assert_eq!(palette.get(0).map(|entry| entry.name.as_str()), Some("Red"));
        assert!(palette.by_name("Blue").is_some());
        assert!(palette.by_name("Magenta").is_none());
    }

    #[test]
    fn display_describes_factors() {
        let red = Treatment::from_srgb_hex("Red", 0xff0000);
        assert_eq!(red.to_string(), "Red (#FF0000, metallic 0.10, roughness 0.60)");
    }
}
