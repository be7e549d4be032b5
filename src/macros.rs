//! Declarative macros for building pipelines
//!
//! Small helpers for constructing steps and matrix axes without the
//! builder ceremony.

/// Creates a step from a command
#[macro_export]
macro_rules! step {
    ($cmd:expr) => {
        $crate::pipeline::Step::run($cmd)
    };
}

/// Creates a list of steps
#[macro_export]
macro_rules! steps {
    ($($step:expr),* $(,)?) => {
        vec![$($step),*]
    };
}

/// Creates a matrix configuration from axis lists
///
/// ```
/// use conveyor::axes;
///
/// let matrix = axes! {
///     python = ["3.10", "3.11", "3.12"],
/// };
/// assert_eq!(matrix.combinations().len(), 3);
/// ```
#[macro_export]
macro_rules! axes {
    ( $( $axis_name:ident = [ $($value:expr),* $(,)? ] ),* $(,)? ) => {{
        let mut matrix = $crate::pipeline::MatrixConfig::new();
        $(
            matrix = matrix.add_axis(
                stringify!($axis_name),
                vec![$($value.to_string()),*],
            );
        )*
        matrix
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_step_macro() {
        let step = step!("make lint");
        assert_eq!(step.command, "make lint");
    }

    #[test]
    fn test_steps_macro() {
        let steps = steps![step!("make lint"), step!("make test")];
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_axes_macro() {
        let matrix = axes! {
            python = ["3.10", "3.11"],
            os = ["linux"],
        };
        assert_eq!(matrix.combinations().len(), 2);
        assert_eq!(matrix.axes[0].name, "python");
    }
}
