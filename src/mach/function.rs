use crate::error;
use crate::lang::Error;
use chrono::Timelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in numeric functions
///
/// Resolves a name and an evaluated argument list to a number. RND
/// carries state: positive or missing argument draws the next value,
/// zero repeats the last one, negative reseeds deterministically.
pub struct Function {
    rng: StdRng,
    last_rnd: f64,
}

impl Default for Function {
    fn default() -> Function {
        Function {
            rng: StdRng::from_entropy(),
            last_rnd: 0.0,
        }
    }
}

impl Function {
    pub fn new() -> Function {
        Function::default()
    }

    /// Fresh entropy at every RUN so programs don't replay the same
    /// sequence.
    pub fn reseed(&mut self) {
        self.rng = StdRng::from_entropy();
    }

    fn arity(name: &str) -> Option<std::ops::RangeInclusive<usize>> {
        match name {
            "ABS" | "ATN" | "COS" | "EXP" | "INT" | "LOG" | "SGN" | "SIN" | "SQR" | "TAN" => {
                Some(1..=1)
            }
            "MAX" | "MIN" => Some(2..=2),
            "RND" => Some(0..=1),
            "TIMER" => Some(0..=0),
            _ => None,
        }
    }

    pub fn call(&mut self, name: &str, args: &[f64]) -> Result<f64> {
        let arity = match Function::arity(name) {
            Some(arity) => arity,
            None => return Err(error!(UndefinedFunction)),
        };
        if !arity.contains(&args.len()) {
            return Err(error!(IllegalFunctionCall; "WRONG NUMBER OF ARGUMENTS"));
        }
        let result = match name {
            "ABS" => args[0].abs(),
            "ATN" => args[0].atan(),
            "COS" => args[0].cos(),
            "EXP" => args[0].exp(),
            "INT" => args[0].floor(),
            "LOG" => {
                if args[0] <= 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                args[0].ln()
            }
            "SGN" => {
                if args[0] > 0.0 {
                    1.0
                } else if args[0] < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            "SIN" => args[0].sin(),
            "SQR" => {
                if args[0] < 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                args[0].sqrt()
            }
            "TAN" => args[0].tan(),
            "MAX" => args[0].max(args[1]),
            "MIN" => args[0].min(args[1]),
            "RND" => self.rnd(args.first().copied()),
            "TIMER" => f64::from(chrono::Local::now().num_seconds_from_midnight()),
            _ => return Err(error!(UndefinedFunction)),
        };
        if !result.is_finite() {
            return Err(error!(Overflow));
        }
        Ok(result)
    }

    fn rnd(&mut self, arg: Option<f64>) -> f64 {
        match arg {
            Some(x) if x == 0.0 => self.last_rnd,
            Some(x) if x < 0.0 => {
                self.rng = StdRng::seed_from_u64(x.to_bits());
                self.last_rnd = self.rng.gen();
                self.last_rnd
            }
            _ => {
                self.last_rnd = self.rng.gen();
                self.last_rnd
            }
        }
    }
}
