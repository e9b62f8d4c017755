/// Scalar type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
}

/// One named, typed column of a record schema.
///
/// Grid-index fields hold 0-based layer/row/column indices in memory but
/// are 1-based in the on-disk representation; the adapters apply the offset
/// at the codec boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub grid_index: bool,
}

impl FieldSpec {
    pub fn int(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            ty: FieldType::Int,
            grid_index: false,
        }
    }

    pub fn float(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            ty: FieldType::Float,
            grid_index: false,
        }
    }

    pub fn index(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            ty: FieldType::Int,
            grid_index: true,
        }
    }
}

/// Fixed-order field list shared by every record in a store.
///
/// A schema is built from a package's base columns and may be extended with
/// named auxiliary `Float` columns at construction time; field order and
/// arity are then fixed for the lifetime of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    fields: Vec<FieldSpec>,
    n_base: usize,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let n_base = fields.len();
        RecordSchema { fields, n_base }
    }

    /// Appends named auxiliary float columns after the base columns.
    pub fn with_aux<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        for name in names {
            self.fields.push(FieldSpec::float(name.as_ref()));
        }
        self
    }

    /// Default GHB schema: layer, row, column, boundary head, conductance.
    pub fn ghb() -> Self {
        RecordSchema::new(vec![
            FieldSpec::index("k"),
            FieldSpec::index("i"),
            FieldSpec::index("j"),
            FieldSpec::float("bhead"),
            FieldSpec::float("cond"),
        ])
    }

    /// LAK dataset 9 schema: one row of flux terms per lake.
    pub fn lak_flux() -> Self {
        RecordSchema::new(vec![
            FieldSpec::float("precip"),
            FieldSpec::float("evap"),
            FieldSpec::float("runoff"),
            FieldSpec::float("withdrawal"),
            FieldSpec::float("ssmn"),
            FieldSpec::float("ssmx"),
        ])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn n_base(&self) -> usize {
        self.n_base
    }

    pub fn n_aux(&self) -> usize {
        self.fields.len() - self.n_base
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn aux_names(&self) -> impl Iterator<Item = &str> {
        self.fields[self.n_base..].iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghb_schema_has_grid_indices_then_science_fields() {
        let schema = RecordSchema::ghb();
        assert_eq!(schema.len(), 5);
        assert!(schema.fields()[0].grid_index);
        assert!(schema.fields()[2].grid_index);
        assert_eq!(schema.fields()[3].ty, FieldType::Float);
        assert!(!schema.fields()[3].grid_index);
    }

    #[test]
    fn aux_columns_extend_the_base_schema() {
        let schema = RecordSchema::ghb().with_aux(&["temp", "conc"]);
        assert_eq!(schema.len(), 7);
        assert_eq!(schema.n_base(), 5);
        assert_eq!(schema.n_aux(), 2);
        let names: Vec<_> = schema.aux_names().collect();
        assert_eq!(names, vec!["temp", "conc"]);
        assert_eq!(schema.fields()[5].ty, FieldType::Float);
    }
}
