//! Fixed read statements for modes 101, 102 and 103.

use crate::query::{Query, StatementKind};

/// Stoppage causes assigned to a station, minus the causes the system raises
/// on its own (configured per company in `UPSYSPARAM`).
pub const STOPPAGE_CAUSES_SQL: &str = r#"SELECT A.*, B.PSTOPCAUSENO, B.PSTOPCAUSENAME, B.GROUPCODE
FROM PSTOPCAUSEWS A
INNER JOIN PSTOPCAUSE B ON A.COMPANYID = B.COMPANYID AND A.PSTOPCAUSEID = B.PSTOPCAUSEID
WHERE A.COMPANYID = @companyId
  AND B.STATUS = 2
  AND A.PWORKSTATIONID = @workstationId
  AND A.PSTOPCAUSEID NOT IN (
    SELECT P.PARAMVALUE FROM UPSYSPARAM P
    WHERE P.COMPANYID = @companyId
      AND P.PARAMVALUE IS NOT NULL
      AND P.PARAMNAME IN ('PSTOPCAUSEID_ACILISDURUS', 'PSTOPCAUSEID_ARKAEKIPMANDURUSU',
        'PSTOPCAUSEID_ONEKIPMANDURUSU', 'PSTOPCAUSEID_PLANYOK', 'PSTOPCAUSEID_NOCONNECTION',
        'PSTOPCAUSEID_VARDIYAYOKDURUSU', 'PSTOPCAUSEID_SHIFTEDSHIFT'))"#;

/// Active stations that belong to a production line.
pub const WORKSTATIONS_SQL: &str = r#"SELECT PWS.PWORKSTATIONID, PWS.PWORKSTATIONNO, PWS.PWORKSTATIONNAME
FROM PLINEDET PL
INNER JOIN PWORKSTATION PWS ON PL.COMPANYID = PWS.COMPANYID AND PL.PWORKSTATIONID = PWS.PWORKSTATIONID
WHERE PWS.COMPANYID = @companyId AND PWS.STATUS = 2"#;

/// Live status of one station: current job, operator, stoppage, OEE figures and units.
pub const STATION_STATUS_SQL: &str = r#"SELECT P.COMPANYID, P.PWORKSTATIONID, P.PEQUIPMENTID, P.CPERIODID, TE.EMPLOYEEID,
  P.PJOBID, P.PJOBORDERID, P.QUANTITY, P.QUANTITY2, P.QUANTITY3, P.LASTQTY, P.LASTQTY2, P.LASTQTY3,
  P.LOADED, P.STOPPED, P.STOPTYPE, P.PSTOPCAUSEID, P.STARTTIME, P.STOPTIME, P.DURATION, P.STOPDUR,
  P.WSSTATUS, P.STOPDURT, P.PLANSTOPTIME, P.NOTPLANSTOPTIME, P.SPEED, P.SPEEDUNIT, P.HOURQUNIT,
  P.HOURQUANTITY, P.WORKTIME, P.SHIFT, P.SHIFTID, P.EMPCHANGEDATE, P.EMPCHANGEQTY, P.AVGSPEED,
  P.RANDIMAN, P.CLIVERSION, P.ACYCLEPERIOD, P.INSERTDATE,
  E.EMPLOYEENO, E.EMPLOYEENAME,
  WS.PWORKSTATIONNO, WS.PWORKSTATIONNAME, WS.STATUS AS ISISTASYONUDURUM,
  WC.PWORKCENTERID, WC.PWORKCENTERNO, WC.PWORKCENTERNAME,
  DBO.[GET_JO_RECEIPTNO_FOR_PID](P.COMPANYID, P.CPERIODID, P.PJOBID) RECEIPTNO,
  DBO.[GET_JO_STOCKNO_FOR_PID](P.COMPANYID, P.CPERIODID, P.PJOBID) STOCKNO,
  DBO.[GET_JO_STOCKNAME_FOR_PID](P.COMPANYID, P.CPERIODID, P.PJOBID) STOCKNAME,
  DBO.[GET_JO_QTYPRO_FOR_PID](P.COMPANYID, P.CPERIODID, P.PJOBID) AS ISEMRIURETIMMIKTAR,
  R.STOCKID, R.GRADEID, R.GRADENAME, R.PEQUIPMENTNO, R.PEQUIPMENTNAME, R.PPROCESSNO, R.PPROCESSNAME,
  R.PPROTREEID, SC.PSTOPCAUSENO, SC.PSTOPCAUSENAME, R.QUANTITY AS ISEMRIMIKTAR, R.DESCRIPTION AS ISACIKLAMA,
  R.PQUANTITY, R.PQUANTITY2, R.PQUANTITY3, R.SPEED AS PLANSPEED, R.CYCLEUNIT, R.CYCLEPERIOD,
  R.CYCLEOFCOE, R.COFSOCKET, R.PROCMULT,
  PWSO.A AS AVAIBILITY, PWSO.P AS PERFORMANS, PWSO.Q AS QUALITY, PWSO.OEE AS OEE,
  DATEDIFF(MINUTE, P.INSERTDATE, GETDATE()) AS BAGLANTI,
  (SELECT SUM(PI.PQUANTITY * ISNULL(PI.CYCLEPERIOD, 0)) FROM PPRODUCTPLANITEM PI (NOLOCK)
    WHERE PI.COMPANYID = R.COMPANYID AND PI.PID = R.PID) AS CALISILANZAMAN,
  P.LOSSQTY ISKARTA, ISNULL(PL.PLINEID, 0) PLINEID,
  UNIT.UNITID, UNIT.UNITNAME, UNIT.UNITID2, UNIT.UNITNAME2, UNIT.UNITID3, UNIT.UNITNAME3,
  PSH.NOTWORKING,
  CASE WHEN P.PSTOPCAUSEID = -999 THEN NULL ELSE DATEDIFF(SECOND, P.STOPTIME, GETDATE()) END STOPSTARTTIME
FROM VE_PWSSTATUS AS P (NOLOCK)
LEFT OUTER JOIN VE_PPRODUCTPLANWS AS R (NOLOCK) ON P.COMPANYID = R.COMPANYID AND P.PJOBID = R.PID
LEFT OUTER JOIN PWORKCENTER AS WC (NOLOCK)
  INNER JOIN PWORKSTATION AS WS (NOLOCK) ON WC.PWORKCENTERID = WS.PWORKCENTERID AND WC.COMPANYID = WS.COMPANYID
  ON P.COMPANYID = WS.COMPANYID AND P.PWORKSTATIONID = WS.PWORKSTATIONID AND WS.STATUS = 2
LEFT OUTER JOIN PWSSTATUSOTHER PWSO (NOLOCK) ON P.COMPANYID = PWSO.COMPANYID AND P.PWORKSTATIONID = PWSO.PWORKSTATIONID
LEFT OUTER JOIN PSTOPCAUSE SC (NOLOCK) ON P.COMPANYID = SC.COMPANYID AND P.PSTOPCAUSEID = SC.PSTOPCAUSEID
LEFT OUTER JOIN TEAMEMPLOYEE AS TE (NOLOCK) ON TE.COMPANYID = P.COMPANYID AND TE.TEAMEMPLOYEEID = P.EMPLOYEEID
LEFT OUTER JOIN EMPLOYEE AS E (NOLOCK) ON TE.COMPANYID = E.COMPANYID AND TE.EMPLOYEEID = E.EMPLOYEEID
LEFT OUTER JOIN PLINEDET PL ON WS.COMPANYID = PL.COMPANYID AND WS.PWORKSTATIONID = PL.PWORKSTATIONID
LEFT JOIN PSHIFTSCHEDULER PSH WITH (NOLOCK) ON PSH.COMPANYID = P.COMPANYID AND PSH.PWORKSTATIONID = P.PWORKSTATIONID
  AND P.INSERTDATE BETWEEN PSH.STARTTIME AND PSH.FINISHTIME
LEFT JOIN (
  SELECT S.COMPANYID, S.STOCKID, S.STOCKNAME, S.UNITID, S.UNITNAME,
    MAX(ISNULL(CASE WHEN X.UNITORDERID = 1 THEN X.UNITID END, 0)) UNITID2,
    MAX(ISNULL(CASE WHEN X.UNITORDERID = 1 THEN X.UNITNAME END, '')) UNITNAME2,
    MAX(ISNULL(CASE WHEN X.UNITORDERID = 2 THEN X.UNITID END, 0)) UNITID3,
    MAX(ISNULL(CASE WHEN X.UNITORDERID = 2 THEN X.UNITNAME END, '')) UNITNAME3
  FROM VE_STOCK S
  LEFT OUTER JOIN (
    SELECT U.*, B.STOCKID,
      ROW_NUMBER() OVER (PARTITION BY U.COMPANYID, B.STOCKID ORDER BY U.COMPANYID, B.STOCKID, B.ITEMNO) UNITORDERID
    FROM STOCKUNIT U WITH (NOLOCK)
    INNER JOIN STOCKUNITS B WITH (NOLOCK) ON U.COMPANYID = B.COMPANYID AND U.UNITID = B.UNITID
    WHERE U.COMPANYID = @companyId
  ) X ON X.COMPANYID = S.COMPANYID AND X.STOCKID = S.STOCKID
  WHERE S.COMPANYID = @companyId
  GROUP BY S.COMPANYID, S.STOCKID, S.STOCKNAME, S.UNITID, S.UNITNAME
) UNIT ON UNIT.STOCKID = R.STOCKID AND UNIT.COMPANYID = R.COMPANYID
WHERE P.COMPANYID = @companyId
  AND P.PWORKSTATIONID = @workstationId
  AND WS.STATUS = 2
  AND ISNULL(WS.NOTVISIBLEFACCON, 0) = 0
ORDER BY P.PWORKSTATIONNO"#;

pub fn stoppage_causes_statement() -> Query {
    Query::new(StatementKind::StoppageCauses, STOPPAGE_CAUSES_SQL)
}

pub fn workstations_statement() -> Query {
    Query::new(StatementKind::Workstations, WORKSTATIONS_SQL)
}

pub fn station_status_statement() -> Query {
    Query::new(StatementKind::StationStatus, STATION_STATUS_SQL)
}
