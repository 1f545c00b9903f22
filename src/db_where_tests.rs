#[cfg(test)]
mod tests {
    use crate::custom::WhereCondition;
    use crate::db_where::{Condition, DbWhere};
    use crate::error::SqlError;
    use crate::field::{DbField, LogicType};
    use pretty_assertions::assert_eq;
    use std::any::Any;

    #[derive(Debug, Clone)]
    struct DataScope;

    impl WhereCondition for DataScope {
        fn type_tag(&self) -> &'static str {
            "acme.auth.DataScope"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn none_is_immutable() {
        let mut none = DbWhere::NONE;
        assert!(none.is_none());
        assert!(none.is_empty());
        assert_eq!(
            none.add("id", "=", 1).err(),
            Some(SqlError::ImmutableCondition)
        );
        assert_eq!(none.clear().err(), Some(SqlError::ImmutableCondition));
        assert_eq!(none.remove("id").err(), Some(SqlError::ImmutableCondition));
        assert!(matches!(
            DbWhere::NONE.on("id", "=", 1),
            Err(SqlError::ImmutableCondition)
        ));
        assert!(matches!(
            DbWhere::NONE.sub(LogicType::Or),
            Err(SqlError::ImmutableCondition)
        ));
        assert!(!DbWhere::new().is_none());
    }

    #[test]
    fn emptiness_ignores_blank_values() {
        let w = DbWhere::new()
            .on("name", "like", "")
            .unwrap()
            .on("code", "in", (None::<&str>, " "))
            .unwrap();
        assert!(w.is_empty());

        let w = w.on("deleted", "isNull", ()).unwrap();
        assert!(!w.is_empty());

        let nested = DbWhere::new()
            .sub(LogicType::Or)
            .unwrap()
            .on("a", "=", None::<i32>)
            .unwrap()
            .end();
        assert!(nested.is_empty());
    }

    #[test]
    fn sub_conditions_nest() {
        let w = DbWhere::new()
            .on("state", "=", 1)
            .unwrap()
            .sub(LogicType::Or)
            .unwrap()
            .on("a", "=", 1)
            .unwrap()
            .sub_not(LogicType::And)
            .on("b", "=", 2)
            .unwrap()
            .on("c", "=", 3)
            .unwrap()
            .end()
            .end();

        assert_eq!(w.items().len(), 2);
        let Condition::Nested(or) = &w.items()[1] else {
            panic!("expected nested condition");
        };
        assert_eq!(or.logic(), LogicType::Or);
        assert!(or.positive());
        let Condition::Nested(not) = &or.items()[1] else {
            panic!("expected nested condition");
        };
        assert!(!not.positive());
        assert_eq!(not.items().len(), 2);
        assert!(w.contains("c"));
    }

    #[test]
    fn sub_with_closure() {
        let mut w = DbWhere::new();
        w.sub_with(LogicType::Or, true, |sub| {
            sub.on("a", "=", 1)?.on("b", "=", 2)
        })
        .unwrap();
        assert!(w.contains("b"));
    }

    #[test]
    fn remove_matches_fields_and_custom_tags() {
        let mut w = DbWhere::new()
            .on("id", "=", 1)
            .unwrap()
            .sub(LogicType::Or)
            .unwrap()
            .on("id", "=", 2)
            .unwrap()
            .on("name", "=", "x")
            .unwrap()
            .end();
        w.put_custom(DataScope).unwrap();

        assert_eq!(w.remove("id").unwrap().len(), 2);
        assert!(!w.contains("id"));
        assert!(w.contains("name"));

        assert!(w.contains("DataScope"));
        assert_eq!(w.remove("acme.auth.DataScope").unwrap().len(), 1);
        assert!(!w.contains("DataScope"));
    }

    #[test]
    fn replace_updates_first_match_or_appends() {
        let mut w = DbWhere::new()
            .on("a", "=", 1)
            .unwrap()
            .sub(LogicType::Or)
            .unwrap()
            .on("b", "=", 2)
            .unwrap()
            .end();
        w.replace(DbField::parse_where("b", ">", 5).unwrap()).unwrap();
        let Condition::Nested(sub) = &w.items()[1] else {
            panic!("expected nested condition");
        };
        let Condition::Field(b) = &sub.items()[0] else {
            panic!("expected field condition");
        };
        assert_eq!(b.operator(), "GreaterThen");

        w.replace(DbField::parse_where("c", "=", 3).unwrap()).unwrap();
        assert_eq!(w.items().len(), 3);
    }

    #[test]
    fn clear_drops_items() {
        let mut w = DbWhere::new().on("a", "=", 1).unwrap();
        w.clear().unwrap();
        assert!(w.items().is_empty());
    }

    #[test]
    fn invalid_operator_fails_immediately() {
        assert!(matches!(
            DbWhere::new().on("a", "between", 1),
            Err(SqlError::MissingArguments { .. })
        ));
        assert!(matches!(
            DbWhere::new().on("a", "??", 1),
            Err(SqlError::UnsupportedOperator { .. })
        ));
    }
}
