//! libsvm model file format
//!
//! A model file is a header of `key value...` lines closed by a line holding
//! `SV`, followed by one line per support vector: its `nr_class - 1`
//! coefficients and then its `index:value` entries.

use super::Model;
use crate::core::{KernelType, Parameter, Result, SVMError, SvmNode, SvmType};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Format a real so that parsing the text yields the same bits
///
/// Both `Display` and `LowerExp` print the shortest representation that
/// round-trips; exponent form is only used where plain digits would be long.
fn fmt_real(v: f64) -> String {
    let magnitude = v.abs();
    if v == 0.0 || (1e-5..1e16).contains(&magnitude) {
        format!("{}", v)
    } else {
        format!("{:e}", v)
    }
}

fn join_reals(values: &[f64]) -> String {
    values.iter().map(|&v| fmt_real(v)).collect::<Vec<_>>().join(" ")
}

fn join<T: ToString>(values: &[T]) -> String {
    values.iter().map(T::to_string).collect::<Vec<_>>().join(" ")
}

/// `key` alone when there are no values
fn header_line(key: &str, values: &str) -> String {
    if values.is_empty() {
        key.to_string()
    } else {
        format!("{} {}", key, values)
    }
}

impl Model {
    /// Write the model in libsvm text format
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        let param = &self.param;
        writeln!(w, "svm_type {}", param.svm_type)?;
        writeln!(w, "kernel_type {}", param.kernel_type)?;

        if param.kernel_type == KernelType::Polynomial {
            writeln!(w, "degree {}", param.degree)?;
        }
        if param.kernel_type.uses_gamma() {
            writeln!(w, "gamma {}", fmt_real(param.gamma))?;
        }
        if param.kernel_type.uses_coef0() {
            writeln!(w, "coef0 {}", fmt_real(param.coef0))?;
        }

        writeln!(w, "nr_class {}", self.nr_class)?;
        writeln!(w, "total_sv {}", self.total_sv())?;
        writeln!(w, "{}", header_line("rho", &join_reals(&self.rho)))?;

        if param.svm_type.is_classification() {
            writeln!(w, "{}", header_line("label", &join(&self.label)))?;
        }
        if let Some(prob_a) = &self.prob_a {
            writeln!(w, "{}", header_line("probA", &join_reals(prob_a)))?;
        }
        if let Some(prob_b) = &self.prob_b {
            writeln!(w, "{}", header_line("probB", &join_reals(prob_b)))?;
        }
        if param.svm_type.is_classification() {
            writeln!(w, "{}", header_line("nr_sv", &join(&self.n_sv)))?;
        }

        writeln!(w, "SV")?;
        let mut line = String::new();
        for k in 0..self.total_sv() {
            line.clear();
            for coef in &self.sv_coef {
                line.push_str(&fmt_real(coef[k]));
                line.push(' ');
            }
            for node in crate::core::row_entries(self.support_vector(k)) {
                // writing into a String cannot fail
                let _ = write!(line, "{}:{} ", node.index, fmt_real(node.value));
            }
            writeln!(w, "{}", line.trim_end())?;
        }

        w.flush()?;
        Ok(())
    }

    /// Write the model to a file in libsvm text format
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Read a model in libsvm text format
    pub fn read_from<R: BufRead>(reader: R) -> Result<Model> {
        let mut lines = reader.lines().enumerate().map(|(i, line)| (i + 1, line));
        let mut header = Header::default();

        loop {
            let (number, line) = match lines.next() {
                Some((number, line)) => (number, line?),
                None => return Err(SVMError::ModelFormat("missing SV section".to_string())),
            };
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else {
                continue;
            };
            if key == "SV" {
                break;
            }
            header.apply(key, tokens, number)?;
        }

        let header = header.validate()?;
        let nr_coef = header.nr_class - 1;
        let mut sv_coef = vec![Vec::with_capacity(header.total_sv); nr_coef];
        let mut sv_space = Vec::new();
        let mut sv = Vec::with_capacity(header.total_sv);

        for (number, line) in lines {
            let line = line?;
            let mut tokens = line.split_whitespace().peekable();
            if tokens.peek().is_none() {
                continue;
            }
            if sv.len() == header.total_sv {
                return Err(SVMError::ModelFormat(format!(
                    "more support vector rows than total_sv {}",
                    header.total_sv
                )));
            }

            for coef in sv_coef.iter_mut() {
                let token = tokens.next().ok_or_else(|| SVMError::ParseError {
                    line: number,
                    message: format!("expected {} coefficients", nr_coef),
                })?;
                coef.push(parse_token(token, number)?);
            }

            sv.push(sv_space.len());
            for token in tokens {
                sv_space.push(parse_node(token, number)?);
            }
            sv_space.push(SvmNode::terminator());
        }

        if sv.len() != header.total_sv {
            return Err(SVMError::ModelFormat(format!(
                "total_sv is {} but {} support vector rows were read",
                header.total_sv,
                sv.len()
            )));
        }

        let model = Model {
            param: header.param,
            nr_class: header.nr_class,
            sv_space,
            sv,
            sv_coef,
            rho: header.rho,
            label: header.label,
            n_sv: header.n_sv,
            sv_indices: Vec::new(),
            prob_a: header.prob_a,
            prob_b: header.prob_b,
        };
        model.validate()?;
        Ok(model)
    }

    /// Read a model file in libsvm text format
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Model> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

fn parse_token<T: std::str::FromStr>(token: &str, line: usize) -> Result<T> {
    token.parse().map_err(|_| SVMError::ParseError {
        line,
        message: format!("invalid value: {}", token),
    })
}

fn parse_node(token: &str, line: usize) -> Result<SvmNode> {
    let (index, value) = token.split_once(':').ok_or_else(|| SVMError::ParseError {
        line,
        message: format!("invalid feature format: {}", token),
    })?;
    Ok(SvmNode::new(
        parse_token(index, line)?,
        parse_token(value, line)?,
    ))
}

fn parse_all<'a, T, I>(tokens: I, line: usize) -> Result<Vec<T>>
where
    T: std::str::FromStr,
    I: Iterator<Item = &'a str>,
{
    tokens.map(|token| parse_token(token, line)).collect()
}

/// Header fields collected before the `SV` line
#[derive(Default)]
struct Header {
    svm_type: Option<SvmType>,
    kernel_type: Option<KernelType>,
    degree: Option<i32>,
    gamma: Option<f64>,
    coef0: Option<f64>,
    nr_class: Option<usize>,
    total_sv: Option<usize>,
    rho: Option<Vec<f64>>,
    label: Option<Vec<i32>>,
    prob_a: Option<Vec<f64>>,
    prob_b: Option<Vec<f64>>,
    n_sv: Option<Vec<usize>>,
}

/// Header after presence and count checks
struct ValidHeader {
    param: Parameter,
    nr_class: usize,
    total_sv: usize,
    rho: Vec<f64>,
    label: Vec<i32>,
    prob_a: Option<Vec<f64>>,
    prob_b: Option<Vec<f64>>,
    n_sv: Vec<usize>,
}

impl Header {
    fn apply<'a, I>(&mut self, key: &str, mut tokens: I, line: usize) -> Result<()>
    where
        I: Iterator<Item = &'a str>,
    {
        let single = |tokens: &mut I| {
            tokens.next().ok_or_else(|| SVMError::ParseError {
                line,
                message: format!("missing value for {}", key),
            })
        };

        match key {
            "svm_type" => self.svm_type = Some(single(&mut tokens)?.parse()?),
            "kernel_type" => self.kernel_type = Some(single(&mut tokens)?.parse()?),
            "degree" => self.degree = Some(parse_token(single(&mut tokens)?, line)?),
            "gamma" => self.gamma = Some(parse_token(single(&mut tokens)?, line)?),
            "coef0" => self.coef0 = Some(parse_token(single(&mut tokens)?, line)?),
            "nr_class" => self.nr_class = Some(parse_token(single(&mut tokens)?, line)?),
            "total_sv" => self.total_sv = Some(parse_token(single(&mut tokens)?, line)?),
            "rho" => self.rho = Some(parse_all(tokens, line)?),
            "label" => self.label = Some(parse_all(tokens, line)?),
            "probA" => self.prob_a = Some(parse_all(tokens, line)?),
            "probB" => self.prob_b = Some(parse_all(tokens, line)?),
            "nr_sv" => self.n_sv = Some(parse_all(tokens, line)?),
            other => {
                return Err(SVMError::ModelFormat(format!(
                    "unknown header key '{}' at line {}",
                    other, line
                )))
            }
        }
        Ok(())
    }

    fn validate(self) -> Result<ValidHeader> {
        let missing = |key: &str| SVMError::ModelFormat(format!("missing {}", key));

        let svm_type = self.svm_type.ok_or_else(|| missing("svm_type"))?;
        let kernel_type = self.kernel_type.ok_or_else(|| missing("kernel_type"))?;
        let nr_class = self.nr_class.ok_or_else(|| missing("nr_class"))?;
        let total_sv = self.total_sv.ok_or_else(|| missing("total_sv"))?;
        let rho = self.rho.ok_or_else(|| missing("rho"))?;

        if nr_class == 0 {
            return Err(SVMError::ModelFormat("nr_class must be at least 1".to_string()));
        }

        let (label, n_sv) = if svm_type.is_classification() {
            (
                self.label.ok_or_else(|| missing("label"))?,
                self.n_sv.ok_or_else(|| missing("nr_sv"))?,
            )
        } else {
            (self.label.unwrap_or_default(), self.n_sv.unwrap_or_default())
        };

        let defaults = Parameter::default();
        let param = Parameter {
            svm_type,
            kernel_type,
            degree: self.degree.unwrap_or(defaults.degree),
            gamma: self.gamma.unwrap_or(defaults.gamma),
            coef0: self.coef0.unwrap_or(defaults.coef0),
            probability: self.prob_a.is_some() && self.prob_b.is_some(),
            ..defaults
        };

        Ok(ValidHeader {
            param,
            nr_class,
            total_sv,
            rho,
            label,
            prob_a: self.prob_a,
            prob_b: self.prob_b,
            n_sv,
        })
    }
}
