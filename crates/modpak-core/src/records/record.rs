use super::schema::{FieldType, RecordSchema};
use super::SchemaError;

/// One scalar record field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
        }
    }

    pub(crate) fn matches(&self, ty: FieldType) -> bool {
        match (self, ty) {
            (Value::Int(_), FieldType::Int) => true,
            (Value::Float(_), FieldType::Float) => true,
            // Integers widen losslessly into float columns.
            (Value::Int(_), FieldType::Float) => true,
            (Value::Float(_), FieldType::Int) => false,
        }
    }

    fn coerce(self, ty: FieldType) -> Value {
        match (self, ty) {
            (Value::Int(v), FieldType::Float) => Value::Float(v as f64),
            (v, _) => v,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// A fixed-order tuple of values conforming to a [`RecordSchema`].
pub type Record = Vec<Value>;

/// An ordered sequence of records sharing one schema.
///
/// Represents all boundary entries active during one stress period. Record
/// order is preserved on write; it affects only output layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    schema: RecordSchema,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(schema: RecordSchema) -> Self {
        RecordSet {
            schema,
            records: Vec::new(),
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Appends a record, validating arity and per-field types against the
    /// schema. Integer values destined for float columns are widened.
    pub fn push(&mut self, values: Record) -> Result<(), SchemaError> {
        let checked = self.check(values)?;
        self.records.push(checked);
        Ok(())
    }

    /// Replaces the record at `index`, or appends when `index == len`.
    pub(crate) fn set_slot(&mut self, index: usize, values: Record) -> Result<(), SchemaError> {
        let checked = self.check(values)?;
        if index == self.records.len() {
            self.records.push(checked);
        } else {
            self.records[index] = checked;
        }
        Ok(())
    }

    fn check(&self, values: Record) -> Result<Record, SchemaError> {
        if values.len() != self.schema.len() {
            return Err(SchemaError::Arity {
                expected: self.schema.len(),
                found: values.len(),
            });
        }
        let mut checked = Vec::with_capacity(values.len());
        for (value, field) in values.into_iter().zip(self.schema.fields()) {
            if !value.matches(field.ty) {
                return Err(SchemaError::Type {
                    field: field.name.clone(),
                    expected: field.ty,
                });
            }
            checked.push(value.coerce(field.ty));
        }
        Ok(checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghb_set() -> RecordSet {
        RecordSet::new(RecordSchema::ghb())
    }

    #[test]
    fn push_accepts_conforming_record() {
        let mut set = ghb_set();
        set.push(vec![
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
            Value::Float(10.0),
            Value::Float(100.0),
        ])
        .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn push_widens_int_into_float_column() {
        let mut set = ghb_set();
        set.push(vec![
            Value::Int(0),
            Value::Int(0),
            Value::Int(0),
            Value::Int(10),
            Value::Int(100),
        ])
        .unwrap();
        assert_eq!(set.records()[0][3], Value::Float(10.0));
    }

    #[test]
    fn push_rejects_wrong_arity() {
        let mut set = ghb_set();
        let err = set
            .push(vec![Value::Int(1), Value::Int(2)])
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::Arity {
                expected: 5,
                found: 2
            }
        );
    }

    #[test]
    fn push_rejects_float_in_int_column() {
        let mut set = ghb_set();
        let err = set
            .push(vec![
                Value::Float(1.5),
                Value::Int(3),
                Value::Int(4),
                Value::Float(10.0),
                Value::Float(100.0),
            ])
            .unwrap_err();
        assert!(matches!(err, SchemaError::Type { ref field, .. } if field == "k"));
    }
}
