use asphalt_map::{FaceCode, SlopeClass};
use proptest::prelude::*;

proptest! {
    #[test]
    fn face_fields_come_from_their_bits(raw in any::<u16>()) {
        let f = FaceCode::decode(raw);
        prop_assert_eq!(f.encode(), raw);
        prop_assert_eq!(f.texture, raw & 0x3FF);
        prop_assert_eq!(f.flat, raw & 0x1000 != 0);
        prop_assert_eq!(f.flip, raw & 0x2000 != 0);
        prop_assert_eq!(f.rotation_degrees(), (raw >> 14) * 90);
        let t = raw & 0x3FF;
        prop_assert_eq!(f.texture_id().is_some(), t != 0 && t <= 992);
    }

    #[test]
    fn ramps_name_one_of_four_directions(code in 0u8..64) {
        let class = SlopeClass::from_code(code);
        let (level, levels) = class.lid_params();
        match class {
            SlopeClass::Flat | SlopeClass::Diagonal(_) => prop_assert_eq!((level, levels), (0, 0)),
            _ => prop_assert!(levels > 0 && level / levels < 4),
        }
        prop_assert_eq!(class.is_diagonal(), (45..=48).contains(&code));
        if code == 0 || code >= 49 {
            prop_assert_eq!(class, SlopeClass::Flat);
        }
    }
}
