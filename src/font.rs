use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slant {
    Normal,
    Italic,
    Oblique,
}

/// A selected font: backend face plus the parameters accumulated by
/// `findfont`/`scalefont` before `setfont` commits them.
#[derive(Debug, Clone)]
pub(crate) struct FontObject {
    pub family: &'static str,
    pub slant: Slant,
    pub bold: bool,
    pub point_size: f64,
    pub matrix: [f64; 6],
}

impl FontObject {
    pub fn new(face: &'static Face) -> Self {
        Self {
            family: face.family,
            slant: face.slant,
            bold: face.bold,
            point_size: 1.0,
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }
}

/// Maps a PostScript font name onto a backend face
#[derive(Debug)]
pub(crate) struct Face {
    pub name: &'static str,
    pub family: &'static str,
    pub slant: Slant,
    pub bold: bool,
}

const fn face(name: &'static str, family: &'static str, slant: Slant, bold: bool) -> Face {
    Face {
        name,
        family,
        slant,
        bold,
    }
}

const TIMES: &str = "Times New Roman";
const ARIAL: &str = "Arial";
const COURIER: &str = "Courier New";

static FACES: &[Face] = &[
    face("Times-Roman", TIMES, Slant::Normal, false),
    face("Times-Italic", TIMES, Slant::Italic, false),
    face("Times-Bold", TIMES, Slant::Normal, true),
    face("Times-BoldItalic", TIMES, Slant::Italic, true),
    face("Helvetica", ARIAL, Slant::Normal, false),
    face("Helvetica-Oblique", ARIAL, Slant::Oblique, false),
    face("Helvetica-Bold", ARIAL, Slant::Normal, true),
    face("Helvetica-BoldOblique", ARIAL, Slant::Oblique, true),
    face("Courier", COURIER, Slant::Normal, false),
    face("Courier-Oblique", COURIER, Slant::Oblique, false),
    face("Courier-Bold", COURIER, Slant::Normal, true),
    face("Courier-BoldOblique", COURIER, Slant::Oblique, true),
    face("Symbol", "Symbol", Slant::Normal, false),
];

static FACES_BY_NAME: Lazy<HashMap<&'static [u8], &'static Face>> = Lazy::new(|| {
    FACES
        .iter()
        .map(|face| (face.name.as_bytes(), face))
        .collect()
});

/// Unknown names fall back to Times
pub(crate) fn find_face(name: &[u8]) -> &'static Face {
    match FACES_BY_NAME.get(name) {
        Some(face) => face,
        None => {
            log::debug!(
                "no face for font {:?}, falling back to Times",
                String::from_utf8_lossy(name)
            );

            &FACES[0]
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_names_resolve() {
        let helvetica_bold = find_face(b"Helvetica-BoldOblique");
        assert_eq!(helvetica_bold.family, ARIAL);
        assert_eq!(helvetica_bold.slant, Slant::Oblique);
        assert!(helvetica_bold.bold);

        let courier = find_face(b"Courier");
        assert_eq!(courier.family, COURIER);
        assert!(!courier.bold);
    }

    #[test]
    fn unknown_names_fall_back_to_times() {
        let face = find_face(b"Comic-Sans");

        assert_eq!(face.family, TIMES);
        assert_eq!(face.slant, Slant::Normal);
        assert!(!face.bold);
    }

    #[test]
    fn fresh_fonts_are_unit_sized() {
        let font = FontObject::new(find_face(b"Times-Bold"));

        assert_eq!(font.point_size, 1.0);
        assert_eq!(font.matrix, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(font.bold);
    }
}
