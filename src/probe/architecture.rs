//! GPU generations and the compute capabilities they ship with.
//!
//! Reference data only: no reporting path looks a device up here.

#[allow(dead_code)]
pub static ARCHITECTURES: &[(&str, &[(i32, i32)])] = &[
    // A100, A40, A30 / A10, A16, A2
    ("Ampere", &[(8, 0), (8, 6)]),
    // H100
    ("Hopper", &[(9, 0)]),
    // T4, Quadro T2000
    ("Turing", &[(7, 5)]),
    // V100
    ("Volta", &[(7, 0)]),
    // P100 / P40, P4
    ("Pascal", &[(6, 0), (6, 1)]),
];
