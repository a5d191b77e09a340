use asphalt_geom::Vec3;
use asphalt_map::SlopeClass;

/// Top surface of a block: four corners in the order
/// `(0,0) (1,0) (1,1) (0,1)`, heights relative to the block's grid z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lid {
    pub corners: [Vec3; 4],
}

impl Lid {
    pub const FLAT: Lid = Lid::level(0.0);

    const fn level(z: f32) -> Lid {
        Lid {
            corners: [
                Vec3::new(0.0, 0.0, z),
                Vec3::new(1.0, 0.0, z),
                Vec3::new(1.0, 1.0, z),
                Vec3::new(0.0, 1.0, z),
            ],
        }
    }

    pub fn for_slope(slope: SlopeClass) -> Lid {
        let (level_index, num_levels) = slope.lid_params();
        construct_lid(level_index, num_levels)
    }

    #[inline]
    pub fn corner(&self, i: usize) -> Vec3 {
        self.corners[i % 4]
    }
}

/// Corner pairs raised per ramp direction: up, down, right, left.
const RAISED: [[usize; 2]; 4] = [[2, 3], [0, 1], [3, 0], [1, 2]];

/// Builds the lid of ramp `level_index` out of `num_levels`.
///
/// `num_levels == 0` is the flat lid at z = 0. Otherwise each level is
/// `1 / num_levels` high, all corners start at
/// `height * (level_index % num_levels) - 1` and the two corners on the
/// `level_index / num_levels` side are raised by one level.
pub fn construct_lid(level_index: u8, num_levels: u8) -> Lid {
    if num_levels == 0 {
        return Lid::FLAT;
    }
    let height = 1.0 / f32::from(num_levels);
    let level = level_index % num_levels;
    let low = height * f32::from(level) - height * f32::from(num_levels);
    let direction = usize::from(level_index / num_levels);

    let mut lid = Lid::level(low);
    if let Some(pair) = RAISED.get(direction) {
        for &i in pair {
            lid.corners[i].z += height;
        }
    }
    lid
}
