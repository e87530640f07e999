//! Boolean constraints over a single comparable value
//!
//! A constraint is an expression tree of comparisons against one implicit
//! reference (usually a clock) joined by logical connectives. Reduction
//! rewrites the tree into a simpler equivalent tree for rendering. Every
//! rewrite rule is an equivalence, so a reduced constraint accepts exactly
//! the same values as the original.
//!
//! Reduction runs in two phases:
//!
//! 1. Logical simplification, repeated until the tree stops changing.
//! 2. For bounded integer domains, comparisons joined by `and`/`or` are
//!    folded into inclusive ranges and rewritten canonically.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on logical rewrite passes
const MAX_LOGICAL_PASSES: usize = 64;

/// Values a [`Constraint`] can compare against.
///
/// Bounded discrete domains override the three methods so reduction can
/// fold comparisons into ranges. Other domains keep the defaults and only
/// get logical simplification.
pub trait ConstraintValue: Clone + PartialEq + PartialOrd + fmt::Display {
    /// Smallest and largest values of the domain
    fn bounds() -> Option<(Self, Self)> {
        None
    }

    /// The next value up, if the domain is discrete and it exists
    fn successor(&self) -> Option<Self> {
        None
    }

    /// The next value down, if the domain is discrete and it exists
    fn predecessor(&self) -> Option<Self> {
        None
    }
}

macro_rules! bounded_integer {
    ($($ty:ty),*) => {
        $(impl ConstraintValue for $ty {
            fn bounds() -> Option<(Self, Self)> {
                Some((<$ty>::MIN, <$ty>::MAX))
            }

            fn successor(&self) -> Option<Self> {
                self.checked_add(1)
            }

            fn predecessor(&self) -> Option<Self> {
                self.checked_sub(1)
            }
        })*
    };
}

bounded_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl ConstraintValue for f32 {}
impl ConstraintValue for f64 {}
impl ConstraintValue for String {}

/// Expression tree over comparisons with an implicit reference value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint<T> {
    /// `x < v`
    LessThan(T),
    /// `x <= v`
    LessThanEqual(T),
    /// `x == v`
    Equal(T),
    /// `x != v`
    NotEqual(T),
    /// `x > v`
    GreaterThan(T),
    /// `x >= v`
    GreaterThanEqual(T),
    /// Both hold
    And(Box<Constraint<T>>, Box<Constraint<T>>),
    /// Either holds
    Or(Box<Constraint<T>>, Box<Constraint<T>>),
    /// The right holds whenever the left does
    Implies(Box<Constraint<T>>, Box<Constraint<T>>),
    /// Negation
    Not(Box<Constraint<T>>),
}

/// Token renderers used by [`Constraint::expression`]
pub struct ExpressionFormat<T> {
    /// `reference < value`
    pub less_than: Box<dyn Fn(&str, &str) -> String>,
    /// `reference <= value`
    pub less_than_equal: Box<dyn Fn(&str, &str) -> String>,
    /// `reference == value`
    pub equal: Box<dyn Fn(&str, &str) -> String>,
    /// `reference != value`
    pub not_equal: Box<dyn Fn(&str, &str) -> String>,
    /// `reference > value`
    pub greater_than: Box<dyn Fn(&str, &str) -> String>,
    /// `reference >= value`
    pub greater_than_equal: Box<dyn Fn(&str, &str) -> String>,
    /// Conjunction of two rendered operands
    pub and: Box<dyn Fn(&str, &str) -> String>,
    /// Disjunction of two rendered operands
    pub or: Box<dyn Fn(&str, &str) -> String>,
    /// Implication of two rendered operands
    pub implies: Box<dyn Fn(&str, &str) -> String>,
    /// Negation of a rendered operand
    pub not: Box<dyn Fn(&str) -> String>,
    /// Parenthesize a compound operand
    pub group: Box<dyn Fn(&str) -> String>,
    /// Render the reference name
    pub label: Box<dyn Fn(&str) -> String>,
    /// Render a compared value
    pub value: Box<dyn Fn(&T) -> String>,
}

impl<T: fmt::Display> Default for ExpressionFormat<T> {
    fn default() -> Self {
        Self {
            less_than: Box::new(|l, r| format!("{l} < {r}")),
            less_than_equal: Box::new(|l, r| format!("{l} <= {r}")),
            equal: Box::new(|l, r| format!("{l} == {r}")),
            not_equal: Box::new(|l, r| format!("{l} != {r}")),
            greater_than: Box::new(|l, r| format!("{l} > {r}")),
            greater_than_equal: Box::new(|l, r| format!("{l} >= {r}")),
            and: Box::new(|l, r| format!("{l} && {r}")),
            or: Box::new(|l, r| format!("{l} || {r}")),
            implies: Box::new(|l, r| format!("{l} -> {r}")),
            not: Box::new(|c| format!("!{c}")),
            group: Box::new(|c| format!("({c})")),
            label: Box::new(str::to_string),
            value: Box::new(|v| v.to_string()),
        }
    }
}

impl<T> Constraint<T> {
    /// `lhs && rhs`
    pub fn and(lhs: Constraint<T>, rhs: Constraint<T>) -> Self {
        Constraint::And(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs || rhs`
    pub fn or(lhs: Constraint<T>, rhs: Constraint<T>) -> Self {
        Constraint::Or(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs -> rhs`
    pub fn implies(lhs: Constraint<T>, rhs: Constraint<T>) -> Self {
        Constraint::Implies(Box::new(lhs), Box::new(rhs))
    }

    /// `!value`
    pub fn not(value: Constraint<T>) -> Self {
        Constraint::Not(Box::new(value))
    }

    /// True for the six comparison leaves
    pub fn is_comparison(&self) -> bool {
        !matches!(
            self,
            Constraint::And(..) | Constraint::Or(..) | Constraint::Implies(..) | Constraint::Not(_)
        )
    }
}

impl<T: Clone> Constraint<T> {
    /// The logical negation, pushed down to the comparisons
    pub fn inverse(&self) -> Self {
        match self {
            Constraint::LessThan(v) => Constraint::GreaterThanEqual(v.clone()),
            Constraint::LessThanEqual(v) => Constraint::GreaterThan(v.clone()),
            Constraint::Equal(v) => Constraint::NotEqual(v.clone()),
            Constraint::NotEqual(v) => Constraint::Equal(v.clone()),
            Constraint::GreaterThan(v) => Constraint::LessThanEqual(v.clone()),
            Constraint::GreaterThanEqual(v) => Constraint::LessThan(v.clone()),
            Constraint::And(l, r) => Constraint::or(l.inverse(), r.inverse()),
            Constraint::Or(l, r) => Constraint::and(l.inverse(), r.inverse()),
            Constraint::Implies(l, r) => Constraint::and((**l).clone(), r.inverse()),
            Constraint::Not(c) => (**c).clone(),
        }
    }
}

impl<T: PartialOrd> Constraint<T> {
    /// Does `x` satisfy the constraint?
    pub fn evaluate(&self, x: &T) -> bool {
        match self {
            Constraint::LessThan(v) => x < v,
            Constraint::LessThanEqual(v) => x <= v,
            Constraint::Equal(v) => x == v,
            Constraint::NotEqual(v) => x != v,
            Constraint::GreaterThan(v) => x > v,
            Constraint::GreaterThanEqual(v) => x >= v,
            Constraint::And(l, r) => l.evaluate(x) && r.evaluate(x),
            Constraint::Or(l, r) => l.evaluate(x) || r.evaluate(x),
            Constraint::Implies(l, r) => !l.evaluate(x) || r.evaluate(x),
            Constraint::Not(c) => !c.evaluate(x),
        }
    }
}

impl<T: ConstraintValue> Constraint<T> {
    /// Simplified equivalent form
    pub fn reduced(&self) -> Self {
        let mut current = self.clone();
        for _ in 0..MAX_LOGICAL_PASSES {
            let next = logical(&current);
            if next == current {
                break;
            }
            current = next;
        }
        match T::bounds() {
            Some(bounds) => numeric(&current, &bounds),
            None => current,
        }
    }

    /// Render the reduced constraint as a boolean expression over
    /// `reference`
    pub fn expression(&self, reference: &str, format: &ExpressionFormat<T>) -> String {
        self.reduced().render(&(format.label)(reference), format)
    }

    fn render(&self, reference: &str, format: &ExpressionFormat<T>) -> String {
        let operand = |c: &Constraint<T>| {
            let rendered = c.render(reference, format);
            if c.is_comparison() {
                rendered
            } else {
                (format.group)(&rendered)
            }
        };
        match self {
            Constraint::LessThan(v) => (format.less_than)(reference, &(format.value)(v)),
            Constraint::LessThanEqual(v) => (format.less_than_equal)(reference, &(format.value)(v)),
            Constraint::Equal(v) => (format.equal)(reference, &(format.value)(v)),
            Constraint::NotEqual(v) => (format.not_equal)(reference, &(format.value)(v)),
            Constraint::GreaterThan(v) => (format.greater_than)(reference, &(format.value)(v)),
            Constraint::GreaterThanEqual(v) => {
                (format.greater_than_equal)(reference, &(format.value)(v))
            }
            Constraint::And(l, r) => (format.and)(&operand(l), &operand(r)),
            Constraint::Or(l, r) => (format.or)(&operand(l), &operand(r)),
            Constraint::Implies(l, r) => (format.implies)(&operand(l), &operand(r)),
            Constraint::Not(c) => (format.not)(&(format.group)(&c.render(reference, format))),
        }
    }
}

impl<T: ConstraintValue> fmt::Display for Constraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression("x", &ExpressionFormat::default()))
    }
}

fn is_negation_of<T: Clone + PartialEq>(candidate: &Constraint<T>, p: &Constraint<T>) -> bool {
    match candidate {
        Constraint::Not(inner) if **inner == *p => true,
        _ => *candidate == p.inverse(),
    }
}

/// One top-down pass of the logical rewrite rules
fn logical<T: Clone + PartialEq>(constraint: &Constraint<T>) -> Constraint<T> {
    use Constraint::{And, Implies, Not, Or};

    match constraint {
        // ¬p ∨ q  ≡  p → q
        Or(l, q) => {
            if let Not(p) = &**l {
                return logical(&Constraint::implies((**p).clone(), (**q).clone()));
            }
            // p ∨ p  ≡  p
            if l == q {
                return logical(l);
            }
        }
        And(l, r) => {
            // p ∧ p  ≡  p
            if l == r {
                return logical(l);
            }
            match (&**l, &**r) {
                // p ∧ (p → q)  ≡  p ∧ q
                (p, Implies(q, r)) if p == &**q => {
                    return logical(&Constraint::and(p.clone(), (**r).clone()));
                }
                // ¬q ∧ (p → q)  ≡  ¬q ∧ ¬p
                (nq, Implies(p, q)) if is_negation_of(nq, q) => {
                    return logical(&Constraint::and(nq.clone(), p.inverse()));
                }
                // (p → q) ∧ (p → r)  ≡  p → (q ∧ r)
                (Implies(p, q), Implies(pp, r)) if p == pp => {
                    return logical(&Constraint::implies(
                        (**p).clone(),
                        Constraint::and((**q).clone(), (**r).clone()),
                    ));
                }
                // (p ∨ q) ∧ (¬p ∨ q)  ≡  q
                (Or(p, q), Or(np, qq)) if q == qq && is_negation_of(np, p) => {
                    return logical(q);
                }
                // (p ∨ q) ∧ ¬p  ≡  ¬p ∧ q
                (Or(p, q), np) if is_negation_of(np, p) => {
                    return logical(&Constraint::and(np.clone(), (**q).clone()));
                }
                // (p ∨ q) ∧ r  ≡  (p ∧ r) ∨ (q ∧ r)
                (Or(p, q), r) => {
                    return logical(&Constraint::or(
                        Constraint::and((**p).clone(), r.clone()),
                        Constraint::and((**q).clone(), r.clone()),
                    ));
                }
                _ => {}
            }
        }
        // ¬c  ≡  inverse(c)
        Not(c) => return logical(&c.inverse()),
        _ => {}
    }

    match constraint {
        And(l, r) => Constraint::and(logical(l), logical(r)),
        Or(l, r) => Constraint::or(logical(l), logical(r)),
        Implies(l, r) => Constraint::implies(logical(l), logical(r)),
        Not(c) => Constraint::not(logical(c)),
        leaf => leaf.clone(),
    }
}

/// Inclusive range accepted by a constraint, `None` when it is not a
/// single non-empty range
fn range_of<T: ConstraintValue>(constraint: &Constraint<T>, bounds: &(T, T)) -> Option<(T, T)> {
    let (min, max) = bounds;
    match constraint {
        Constraint::LessThan(v) => v.predecessor().map(|hi| (min.clone(), hi)),
        Constraint::LessThanEqual(v) => Some((min.clone(), v.clone())),
        Constraint::Equal(v) => Some((v.clone(), v.clone())),
        Constraint::GreaterThan(v) => v.successor().map(|lo| (lo, max.clone())),
        Constraint::GreaterThanEqual(v) => Some((v.clone(), max.clone())),
        Constraint::And(l, r) => intersect(range_of(l, bounds)?, range_of(r, bounds)?),
        _ => None,
    }
}

fn intersect<T: ConstraintValue>(a: (T, T), b: (T, T)) -> Option<(T, T)> {
    let lo = if a.0 >= b.0 { a.0 } else { b.0 };
    let hi = if a.1 <= b.1 { a.1 } else { b.1 };
    (lo <= hi).then_some((lo, hi))
}

/// Union of two ranges that overlap or touch
fn union<T: ConstraintValue>(a: (T, T), b: (T, T)) -> Option<(T, T)> {
    let (first, second) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let touches = second.0 <= first.1 || first.1.successor().as_ref() == Some(&second.0);
    if !touches {
        return None;
    }
    let hi = if first.1 >= second.1 { first.1 } else { second.1 };
    Some((first.0, hi))
}

fn from_range<T: ConstraintValue>((lo, hi): (T, T), bounds: &(T, T)) -> Constraint<T> {
    let (min, max) = bounds;
    if lo == hi {
        Constraint::Equal(lo)
    } else if lo == *min {
        Constraint::LessThanEqual(hi)
    } else if hi == *max {
        Constraint::GreaterThanEqual(lo)
    } else {
        Constraint::and(Constraint::GreaterThanEqual(lo), Constraint::LessThanEqual(hi))
    }
}

fn is_everything<T: ConstraintValue>(constraint: &Constraint<T>, bounds: &(T, T)) -> bool {
    range_of(constraint, bounds).is_some_and(|(lo, hi)| lo == bounds.0 && hi == bounds.1)
}

/// Fold comparisons into canonical ranges, bottom up
fn numeric<T: ConstraintValue>(constraint: &Constraint<T>, bounds: &(T, T)) -> Constraint<T> {
    match constraint {
        Constraint::And(l, r) => {
            let l = numeric(l, bounds);
            let r = numeric(r, bounds);
            if is_everything(&l, bounds) {
                return r;
            }
            if is_everything(&r, bounds) {
                return l;
            }
            match (range_of(&l, bounds), range_of(&r, bounds)) {
                (Some(a), Some(b)) => match intersect(a, b) {
                    Some(range) => from_range(range, bounds),
                    None => Constraint::and(l, r),
                },
                _ => Constraint::and(l, r),
            }
        }
        Constraint::Or(l, r) => {
            let l = numeric(l, bounds);
            let r = numeric(r, bounds);
            if is_everything(&l, bounds) {
                return l;
            }
            if is_everything(&r, bounds) {
                return r;
            }
            match (range_of(&l, bounds), range_of(&r, bounds)) {
                (Some(a), Some(b)) => match union(a, b) {
                    Some(range) => from_range(range, bounds),
                    None => Constraint::or(l, r),
                },
                _ => Constraint::or(l, r),
            }
        }
        Constraint::Implies(l, r) => Constraint::implies(numeric(l, bounds), numeric(r, bounds)),
        Constraint::Not(c) => Constraint::not(numeric(c, bounds)),
        leaf => match range_of(leaf, bounds) {
            Some(range) => from_range(range, bounds),
            None => leaf.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Constraint::*;

    #[test]
    fn test_inverse_is_negation() {
        let c = Constraint::and(LessThan(5_u64), Constraint::implies(Equal(2), GreaterThan(7)));
        for x in 0..12 {
            assert_eq!(c.inverse().evaluate(&x), !c.evaluate(&x));
        }
    }

    #[test]
    fn test_material_implication() {
        let c: Constraint<u64> = Constraint::or(Constraint::not(LessThan(5)), Equal(9));
        assert_eq!(
            logical(&c),
            Constraint::implies(LessThan(5), Equal(9))
        );
    }

    #[test]
    fn test_modus_ponens_keeps_the_premise() {
        let p = GreaterThan(3_i32);
        let c = Constraint::and(p.clone(), Constraint::implies(p.clone(), LessThan(10)));
        assert_eq!(logical(&c), Constraint::and(p, LessThan(10)));
    }

    #[test]
    fn test_ranges_clamp() {
        let c = Constraint::and(GreaterThan(3_u64), LessThan(10));
        assert_eq!(c.reduced(), Constraint::and(GreaterThanEqual(4), LessThanEqual(9)));

        let c = Constraint::or(LessThanEqual(4_u64), GreaterThanEqual(5));
        assert_eq!(c.reduced(), LessThanEqual(u64::MAX));

        let c = Constraint::or(Equal(4_u64), Constraint::and(GreaterThan(4), LessThan(8)));
        assert_eq!(c.reduced(), Constraint::and(GreaterThanEqual(4), LessThanEqual(7)));
    }

    #[test]
    fn test_trivially_true_operand_in_or_dominates() {
        let c = Constraint::or(GreaterThanEqual(0_u64), NotEqual(3));
        assert!(is_everything(&c.reduced(), &(u64::MIN, u64::MAX)));
        for x in 0..8 {
            assert!(c.reduced().evaluate(&x));
        }
    }

    #[test]
    fn test_empty_comparisons_are_kept() {
        let c = Constraint::or(LessThan(0_u64), Equal(3));
        let reduced = c.reduced();
        for x in 0..8 {
            assert_eq!(reduced.evaluate(&x), x == 3);
        }
    }

    #[test]
    fn test_expression_rendering() {
        let c = Constraint::or(Equal(2_u64), Constraint::and(GreaterThan(5), NotEqual(7)));
        assert_eq!(c.expression("clock", &ExpressionFormat::default()), "clock == 2 || (clock >= 6 && clock != 7)");

        let nusmv = ExpressionFormat::<u64> {
            and: Box::new(|l, r| format!("{l} & {r}")),
            or: Box::new(|l, r| format!("{l} | {r}")),
            equal: Box::new(|l, r| format!("{l} = {r}")),
            label: Box::new(|name| format!("c_{name}")),
            ..ExpressionFormat::default()
        };
        assert_eq!(
            Constraint::and(Equal(1_u64), NotEqual(1)).expression("t", &nusmv),
            "c_t = 1 & c_t != 1"
        );
    }

    #[test]
    fn test_float_domain_only_simplifies_logically() {
        let c = Constraint::not(LessThan(1.5_f64));
        assert_eq!(c.reduced(), GreaterThanEqual(1.5));
        assert_eq!(c.to_string(), "x >= 1.5");
    }
}
