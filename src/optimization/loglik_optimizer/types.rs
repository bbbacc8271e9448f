//! loglik_optimizer::types — numeric aliases and pre-wired L-BFGS solvers.
//!
//! Every fit pass works on a dense vector of *free, internal* coordinates
//! (see `numerical_stability::transformations`); these aliases name that
//! vector, its gradient and curvature, and the argmin solver types built on
//! them.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Internal coordinates of the free parameters of one fit pass.
pub type Theta = Array1<f64>;

/// Gradient with the shape of [`Theta`].
pub type Grad = Array1<f64>;

/// Dense `n × n` curvature matrix, `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value. Argmin minimizes `c(θ) = -ℓ(θ)`.
pub type Cost = f64;

/// Argmin function-evaluation counters (`"cost_count"`, `"gradient_count"`, ...).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
